use super::Menu;
use greeter_core::server;
use greeter_core::{Greeter, GreeterClient, LoggingInterceptor, ServiceConfig};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

struct Server {
    url: String,
    shutdown: oneshot::Sender<()>,
    handle: JoinHandle<Result<(), server::ServeError>>,
}

impl Server {
    async fn start(config: ServiceConfig) -> Self {
        let listener = server::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
            .await
            .unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());

        let (shutdown, rx) = oneshot::channel::<()>();
        let greeter = Greeter::new(config)
            .with_unary_interceptor(LoggingInterceptor::server())
            .with_stream_interceptor(LoggingInterceptor::server());
        let handle = tokio::spawn(server::serve(listener, greeter, async {
            drop(rx.await)
        }));

        Self {
            url,
            shutdown,
            handle,
        }
    }

    async fn stop(self) {
        self.shutdown.send(()).unwrap();
        self.handle.await.unwrap().unwrap();
    }
}

fn fast_config() -> ServiceConfig {
    ServiceConfig {
        response_interval: Duration::from_millis(1),
        ..ServiceConfig::default()
    }
}

async fn run_session(server: &Server, input: &str) -> String {
    colored::control::set_override(false);

    let client = GreeterClient::connect(&server.url)
        .await
        .unwrap()
        .with_unary_interceptor(LoggingInterceptor::client())
        .with_stream_interceptor(LoggingInterceptor::client());

    let output = Menu::new(client, input.as_bytes(), Vec::new())
        .run()
        .await
        .unwrap();

    String::from_utf8(output).unwrap()
}

#[tokio::test]
async fn test_menu_unary_call() {
    let server = Server::start(fast_config()).await;

    let output = run_session(&server, "1\nAlice\n5\n").await;

    assert!(output.starts_with("1: send Request\n2: HelloServerStream\n"));
    assert!(output.contains("please enter >"));
    assert!(output.contains("Please enter your name.\nHello, Alice!\n"));
    assert!(output.ends_with("bye.\n"));

    server.stop().await;
}

#[tokio::test]
async fn test_menu_prints_injected_error() {
    let server = Server::start(ServiceConfig {
        inject_error: true,
        ..fast_config()
    })
    .await;

    let output = run_session(&server, "1\nAlice\n5\n").await;

    assert!(output.contains("code: Unknown\nmessage: unknown error occurred\n"));
    assert!(output.contains("detail reason of err"));
    assert!(!output.contains("Hello, Alice!"));
    // The menu keeps going after a failed call.
    assert!(output.ends_with("bye.\n"));

    server.stop().await;
}

#[tokio::test]
async fn test_menu_server_stream() {
    let server = Server::start(fast_config()).await;

    let output = run_session(&server, "2\nBob\n5\n").await;

    let expected: String = (0..5).map(|i| format!("[{i}] Hello, Bob!\n")).collect();
    assert!(output.contains(&expected));
    assert!(output.contains(&format!("{expected}all the responses have already received.\n")));

    server.stop().await;
}

#[tokio::test]
async fn test_menu_client_stream() {
    let server = Server::start(fast_config()).await;

    let output = run_session(&server, "3\na\nb\nc\nd\ne\n5\n").await;

    assert!(output.contains("Please enter 5 names.\nHello, [a b c d e]!\n"));

    server.stop().await;
}

#[tokio::test]
async fn test_menu_bidi_stream_alternates() {
    let server = Server::start(fast_config()).await;

    let output = run_session(&server, "4\na\nb\nc\nd\ne\n5\n").await;

    assert!(output.contains(
        "Please enter 5 names.\nHello, a!\nHello, b!\nHello, c!\nHello, d!\nHello, e!\n"
    ));
    assert!(output.ends_with("bye.\n"));

    server.stop().await;
}

#[tokio::test]
async fn test_menu_ignores_unknown_choices_and_ends_on_eof() {
    let server = Server::start(fast_config()).await;

    let output = run_session(&server, "9\n\n1\nCarol\n").await;

    assert_eq!(output.matches("please enter >").count(), 4);
    assert!(output.contains("Hello, Carol!\n"));
    assert!(!output.contains("bye."));

    server.stop().await;
}

#[tokio::test]
async fn test_menu_stops_when_input_ends_mid_stream() {
    let server = Server::start(fast_config()).await;

    let output = run_session(&server, "3\na\nb\n").await;

    assert!(output.contains("Please enter 5 names.\n"));
    assert!(!output.contains("Hello, ["));

    server.stop().await;
}
