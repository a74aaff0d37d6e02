use crate::config::{CLIENT_URL_ENV, DATABASE_URL_ENV, PORT_ENV};
use std::io;
use std::sync::{Arc, Mutex};
use tracing_subscriber::fmt::MakeWriter;

/// Runs `f` with every HOSPITAL_ variable and the plain PORT, CLIENT_URL and
/// DATABASE_URL variables unset
pub(crate) fn with_no_hospital_vars<F: FnOnce() -> R, R>(f: F) -> R {
    let mut vars = std::env::vars()
        .map(|(k, _v)| k)
        .filter(|k| k.starts_with("HOSPITAL_"))
        .collect::<Vec<_>>();

    vars.extend([PORT_ENV, CLIENT_URL_ENV, DATABASE_URL_ENV].map(str::to_string));

    temp_env::with_vars_unset(&vars, f)
}

///
/// Collects everything a subscriber writes so tests can assert on log lines
///
#[derive(Clone, Default)]
pub(crate) struct MockMakeWriter {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl MockMakeWriter {
    /// Drains the captured output
    pub(crate) fn get_string(&self) -> String {
        let mut buf = self.buf.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let captured = String::from_utf8_lossy(&buf).into_owned();
        buf.clear();
        captured
    }
}

pub(crate) struct MockWriter(Arc<Mutex<Vec<u8>>>);

impl io::Write for MockWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut inner = self
            .0
            .lock()
            .map_err(|_| io::Error::other("log buffer poisoned"))?;
        inner.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for MockMakeWriter {
    type Writer = MockWriter;

    fn make_writer(&'a self) -> Self::Writer {
        MockWriter(self.buf.clone())
    }
}
