//! Event stream written to stdout in streaming mode.

use std::io::Write;

use serde::Serialize;

use crate::error::HostError;

/// One event for the host's pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub stanza: String,
    /// Payload, usually one JSON object.
    pub data: String,
    /// Seconds since the epoch. `None` lets the host stamp the event.
    pub time: Option<f64>,
    pub host: Option<String>,
    pub source: Option<String>,
    pub sourcetype: Option<String>,
    pub index: Option<String>,
}

impl Event {
    #[must_use]
    pub fn new(stanza: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            stanza: stanza.into(),
            data: data.into(),
            time: None,
            host: None,
            source: None,
            sourcetype: None,
            index: None,
        }
    }

    #[must_use]
    pub const fn with_time(mut self, time: Option<f64>) -> Self {
        self.time = time;
        self
    }

    #[must_use]
    pub fn with_sourcetype(mut self, sourcetype: impl Into<String>) -> Self {
        self.sourcetype = Some(sourcetype.into());
        self
    }

    #[must_use]
    pub fn with_index(mut self, index: impl Into<String>) -> Self {
        self.index = Some(index.into());
        self
    }

    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

#[derive(Serialize)]
#[serde(rename = "event")]
struct EventXml<'a> {
    #[serde(rename = "@stanza")]
    stanza: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    time: Option<String>,
    data: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    host: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    source: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sourcetype: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    index: Option<&'a str>,
}

impl<'a> From<&'a Event> for EventXml<'a> {
    fn from(event: &'a Event) -> Self {
        Self {
            stanza: &event.stanza,
            time: event.time.map(|t| format!("{t:.3}")),
            data: &event.data,
            host: event.host.as_deref(),
            source: event.source.as_deref(),
            sourcetype: event.sourcetype.as_deref(),
            index: event.index.as_deref(),
        }
    }
}

/// Writes `<stream>`-wrapped events.
///
/// The opening tag goes out with the first event and the closing tag on
/// [`close`](Self::close), so a run without events writes nothing.
pub struct EventWriter<W: Write> {
    out: W,
    opened: bool,
    written: usize,
}

impl<W: Write> EventWriter<W> {
    pub const fn new(out: W) -> Self {
        Self {
            out,
            opened: false,
            written: 0,
        }
    }

    /// Write one event and flush it.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::Xml`] if the event cannot be rendered and
    /// [`HostError::Io`] if the sink fails.
    pub fn write_event(&mut self, event: &Event) -> Result<(), HostError> {
        let xml = quick_xml::se::to_string(&EventXml::from(event))
            .map_err(|e| HostError::Xml(e.to_string()))?;
        if !self.opened {
            self.out.write_all(b"<stream>")?;
            self.opened = true;
        }
        self.out.write_all(xml.as_bytes())?;
        self.out.flush()?;
        self.written += 1;
        Ok(())
    }

    /// Events written so far.
    #[must_use]
    pub const fn written(&self) -> usize {
        self.written
    }

    /// Close the stream and hand back the sink.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::Io`] if the sink fails.
    pub fn close(mut self) -> Result<W, HostError> {
        if self.opened {
            self.out.write_all(b"</stream>")?;
        }
        self.out.flush()?;
        Ok(self.out)
    }
}
