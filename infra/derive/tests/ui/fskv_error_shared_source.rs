use fskv_derive::fskv_error;
use std::borrow::Cow;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[fskv_error]
pub enum CodecError {
    #[error("Encode failure{}: {source}", format_context(.context))]
    Encode { source: BoxError, context: Option<Cow<'static, str>> },

    #[error("Decode failure{}: {source}", format_context(.context))]
    Decode { source: BoxError, context: Option<Cow<'static, str>> },

    #[error("IO failure{}: {source}", format_context(.context))]
    Io { source: std::io::Error, context: Option<Cow<'static, str>> },
}

fn decode(bytes: &[u8]) -> Result<String, CodecError> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| CodecError::Decode { source: Box::new(e), context: None })?;
    Ok(text.to_owned())
}

fn main() {
    let _ = decode(b"ok");
    let _: CodecError = std::io::Error::other("x").into();
}
