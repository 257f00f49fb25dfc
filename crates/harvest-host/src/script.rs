//! Modular input entry point.
//!
//! The host runs a connector in one of three modes: `--scheme` (print the
//! scheme), `--validate-arguments` (check one stanza read from stdin) or no
//! flag (stream events for the stanzas read from stdin).

use std::future::Future;
use std::io::{Read, Write};

use serde::Serialize;

use crate::definition::{InputDefinition, ValidationDefinition};
use crate::error::HostError;
use crate::event::EventWriter;
use crate::scheme::Scheme;

/// How the host invoked the connector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Scheme,
    ValidateArguments,
    Stream,
}

/// A connector the host can drive.
pub trait ModularInput {
    type Error: Into<Box<dyn std::error::Error + Send + Sync>>;

    fn scheme(&self) -> Scheme;

    /// Reject a stanza before the host saves it.
    ///
    /// # Errors
    ///
    /// The error's message is shown to the user.
    fn validate(&self, definition: &ValidationDefinition) -> Result<(), Self::Error>;

    /// Collect and write events for every stanza in `inputs`.
    fn stream_events<W: Write>(
        &self,
        inputs: &InputDefinition,
        writer: &mut EventWriter<W>,
    ) -> impl Future<Output = Result<(), Self::Error>>;
}

#[derive(Serialize)]
#[serde(rename = "error")]
struct ErrorXml<'a> {
    message: &'a str,
}

/// Run `input` in `mode`, reading the host's document from `stdin` and
/// writing the answer to `stdout`.
///
/// # Errors
///
/// - [`HostError::Xml`] / [`HostError::Io`] for protocol failures.
/// - [`HostError::Input`] when validation rejects the stanza (after the
///   `<error>` document has been written) or when streaming fails.
pub async fn run<M, R, W>(
    input: &M,
    mode: Mode,
    mut stdin: R,
    mut stdout: W,
) -> Result<(), HostError>
where
    M: ModularInput,
    R: Read,
    W: Write,
{
    match mode {
        Mode::Scheme => {
            stdout.write_all(input.scheme().to_xml()?.as_bytes())?;
            stdout.flush()?;
            Ok(())
        }
        Mode::ValidateArguments => {
            let mut xml = String::new();
            stdin.read_to_string(&mut xml)?;
            let definition = ValidationDefinition::parse(&xml)?;
            match input.validate(&definition) {
                Ok(()) => Ok(()),
                Err(e) => {
                    let e: Box<dyn std::error::Error + Send + Sync> = e.into();
                    let message = e.to_string();
                    tracing::error!(
                        stanza = %definition.stanza.name,
                        %message,
                        "validation failed"
                    );
                    let xml = quick_xml::se::to_string(&ErrorXml { message: &message })
                        .map_err(|err| HostError::Xml(err.to_string()))?;
                    stdout.write_all(xml.as_bytes())?;
                    stdout.flush()?;
                    Err(HostError::Input(e))
                }
            }
        }
        Mode::Stream => {
            let mut xml = String::new();
            stdin.read_to_string(&mut xml)?;
            let inputs = InputDefinition::parse(&xml)?;
            let mut writer = EventWriter::new(stdout);
            let outcome = input.stream_events(&inputs, &mut writer).await;
            let written = writer.written();
            writer.close()?;
            tracing::info!(written, "event stream closed");
            outcome.map_err(|e| HostError::Input(e.into()))
        }
    }
}
