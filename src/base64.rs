use base64::{Engine, engine::general_purpose::STANDARD};

pub(crate) fn encode<T: AsRef<[u8]>>(input: T) -> String {
    STANDARD.encode(input)
}
