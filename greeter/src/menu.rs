//! # Interactive Menu
//!
//! Drives a [`GreeterClient`] from line-based input. Each menu entry exercises one
//! call shape of the service and prints the greetings it receives.
//!
//! Input and output are generic so the whole session can run against in-memory
//! buffers.
use crate::formatter::FormattedString;
use greeter_core::GreeterClient;
use greeter_core::greeting_service::HelloRequest;
use greeter_core::interceptor::{ClientStreamInterceptor, UnaryInterceptor};
use greeter_core::tonic::Status;
use std::io::{self, Write};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};

/// Names read by the client streaming and bidirectional entries.
pub const NAMES_PER_STREAM: usize = 5;

const MENU: [&str; 5] = [
    "1: send Request",
    "2: HelloServerStream",
    "3: HelloClientStream",
    "4: HelloBiStream",
    "5: exit",
];

enum Flow {
    Continue,
    Exit,
}

pub struct Menu<R, W, U, C> {
    input: Lines<R>,
    output: W,
    client: GreeterClient<U, C>,
}

impl<R, W, U, C> Menu<R, W, U, C>
where
    R: AsyncBufRead + Unpin,
    W: Write,
    U: UnaryInterceptor,
    C: ClientStreamInterceptor,
{
    pub fn new(client: GreeterClient<U, C>, input: R, output: W) -> Self {
        Self {
            input: input.lines(),
            output,
            client,
        }
    }

    /// Runs the session until the user picks `exit` or the input ends.
    ///
    /// Call failures are printed and the menu continues. Only I/O errors on the input
    /// or output abort the session. Returns the output writer.
    pub async fn run(mut self) -> io::Result<W> {
        loop {
            for line in MENU {
                writeln!(self.output, "{line}")?;
            }
            write!(self.output, "please enter >")?;
            self.output.flush()?;

            let Some(choice) = self.read_line().await? else {
                break;
            };

            let flow = match choice.trim() {
                "1" => self.hello().await?,
                "2" => self.hello_server_stream().await?,
                "3" => self.hello_client_stream().await?,
                "4" => self.hello_bi_streams().await?,
                "5" => {
                    writeln!(self.output, "bye.")?;
                    Flow::Exit
                }
                _ => Flow::Continue,
            };

            if let Flow::Exit = flow {
                break;
            }
        }

        self.output.flush()?;
        Ok(self.output)
    }

    async fn read_line(&mut self) -> io::Result<Option<String>> {
        self.input.next_line().await
    }

    async fn read_name(&mut self) -> io::Result<Option<String>> {
        writeln!(self.output, "Please enter your name.")?;
        self.output.flush()?;
        self.read_line().await
    }

    fn print_status(&mut self, status: &Status) -> io::Result<()> {
        write!(self.output, "{}", FormattedString::from(status))
    }

    async fn hello(&mut self) -> io::Result<Flow> {
        let Some(name) = self.read_name().await? else {
            return Ok(Flow::Exit);
        };

        match self.client.hello(name).await {
            Ok(response) => writeln!(self.output, "{}", response.message)?,
            Err(status) => self.print_status(&status)?,
        }

        Ok(Flow::Continue)
    }

    async fn hello_server_stream(&mut self) -> io::Result<Flow> {
        let Some(name) = self.read_name().await? else {
            return Ok(Flow::Exit);
        };

        let mut stream = match self.client.hello_server_stream(name).await {
            Ok(stream) => stream,
            Err(status) => {
                self.print_status(&status)?;
                return Ok(Flow::Continue);
            }
        };

        loop {
            match stream.recv().await {
                Ok(Some(response)) => {
                    writeln!(self.output, "{}", response.message)?;
                    self.output.flush()?;
                }
                Ok(None) => {
                    writeln!(self.output, "all the responses have already received.")?;
                    break;
                }
                Err(status) => {
                    self.print_status(&status)?;
                    break;
                }
            }
        }

        Ok(Flow::Continue)
    }

    async fn hello_client_stream(&mut self) -> io::Result<Flow> {
        let mut stream = self.client.hello_client_stream();

        writeln!(self.output, "Please enter {NAMES_PER_STREAM} names.")?;
        self.output.flush()?;

        for _ in 0..NAMES_PER_STREAM {
            let Some(name) = self.read_line().await? else {
                return Ok(Flow::Exit);
            };

            if let Err(status) = stream.send(HelloRequest { name }).await {
                self.print_status(&status)?;
                break;
            }
        }

        stream.close_send();

        match stream.recv().await {
            Ok(Some(response)) => writeln!(self.output, "{}", response.message)?,
            Ok(None) => writeln!(self.output, "the server closed the stream without a reply")?,
            Err(status) => self.print_status(&status)?,
        }

        Ok(Flow::Continue)
    }

    /// Alternates between sending one name and receiving one greeting until both
    /// directions are finished.
    async fn hello_bi_streams(&mut self) -> io::Result<Flow> {
        let mut stream = self.client.hello_bi_streams();

        writeln!(self.output, "Please enter {NAMES_PER_STREAM} names.")?;
        self.output.flush()?;

        let mut sent = 0;
        let mut send_end = false;
        let mut recv_end = false;

        while !(send_end && recv_end) {
            if !send_end {
                let Some(name) = self.read_line().await? else {
                    return Ok(Flow::Exit);
                };
                sent += 1;

                if let Err(status) = stream.send(HelloRequest { name }).await {
                    self.print_status(&status)?;
                    send_end = true;
                }
                if sent == NAMES_PER_STREAM {
                    send_end = true;
                }
                if send_end {
                    stream.close_send();
                }
            }

            if !recv_end {
                match stream.recv().await {
                    Ok(Some(response)) => {
                        writeln!(self.output, "{}", response.message)?;
                        self.output.flush()?;
                    }
                    Ok(None) => recv_end = true,
                    Err(status) => {
                        self.print_status(&status)?;
                        recv_end = true;
                    }
                }
            }
        }

        Ok(Flow::Continue)
    }
}

#[cfg(test)]
mod integration_test;
