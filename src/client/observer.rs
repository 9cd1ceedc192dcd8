use std::io::Write;

/// Capability interface for whatever consumes the downloaded stream.
///
/// `on_data` sees each body chunk as it arrives, `on_complete` fires once at
/// end-of-stream.
pub trait TransferObserver {
    fn on_data(&mut self, chunk: &[u8]);
    fn on_complete(&mut self);
}

/// Supplies the target path for a run; invoked once. Blocking here is
/// acceptable, it happens before any socket operation is in flight.
pub trait UriProvider {
    fn next_target(&mut self) -> std::io::Result<String>;
}

/// Prompts on stdout and reads the target path from stdin.
pub struct StdinUriProvider;

impl UriProvider for StdinUriProvider {
    fn next_target(&mut self) -> std::io::Result<String> {
        print!("Enter URI: ");
        std::io::stdout().flush()?;

        let mut line = String::new();
        std::io::stdin().read_line(&mut line)?;
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }
}

/// Demo observer: accumulates the stream and prints it at completion.
#[derive(Debug, Default)]
pub struct CollectingObserver {
    data: Vec<u8>,
}

impl CollectingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

impl TransferObserver for CollectingObserver {
    fn on_data(&mut self, chunk: &[u8]) {
        self.data.extend_from_slice(chunk);
    }

    fn on_complete(&mut self) {
        println!("{}", String::from_utf8_lossy(&self.data));
    }
}
