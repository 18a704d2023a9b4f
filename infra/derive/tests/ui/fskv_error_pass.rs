use fskv_derive::fskv_error;
use std::borrow::Cow;

#[fskv_error]
pub enum DemoError {
    #[error("IO error{}: {source}", format_context(.context))]
    Io {
        #[source]
        source: std::io::Error,
        context: Option<Cow<'static, str>>,
    },

    #[error("Missing entry{}: {message}", format_context(.context))]
    Missing { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

fn read(path: &str) -> Result<Vec<u8>, DemoError> {
    std::fs::read(path).context("reading demo file")
}

fn main() {
    let _ = read("/nonexistent");
    let _ = DemoError::Missing { message: "entry".into(), context: None };
    let _: Result<(), DemoError> = Err::<(), _>(DemoError::Missing { message: "x".into(), context: None }).context("lookup");
}
