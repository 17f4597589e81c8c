//! Wi-Fi setup portal, the kind of UI a device serves from its access point.
//!
//! ```text
//! RUST_LOG=debug cargo run --example portal -- 127.0.0.1:8080
//! ```

use std::env;
use std::time::Duration;

use wisp::http::StatusCode;
use wisp::multipart::get_file;
use wisp::server::tcp::TcpAcceptor;
use wisp::server::Host;
use wisp::{Config, Error, Page, Params, Request, Responder, Result, Router, Server};

fn index(res: &mut Responder<'_>, _req: &Request<'_>) -> Result<()> {
    let mut page = Page::new("Device setup");
    page.heading("Wi-Fi")
        .form("/wifi/apply", "post", wisp::page::URLENCODED)
        .textbox("ssid", "SSID", "")
        .textbox("pass", "Password", "")
        .select("band", &["2.4 GHz", "5 GHz"], 0)
        .number("ch", "Channel", 6)
        .checkbox("dhcp", "DHCP", true)
        .submit("Apply")
        .end_form()
        .button("/upload", "Firmware update");
    page.finish(res)
}

fn wifi_apply(res: &mut Responder<'_>, req: &Request<'_>) -> Result<()> {
    let mut params = Params::new();

    let Some(ssid) = params.get(req, "ssid").and_then(|p| p.as_str()).map(str::to_string) else {
        return res.respond(StatusCode::BAD_REQUEST, "text/plain", b"ssid required\r\n", "");
    };

    let dhcp = params.get(req, "dhcp").is_some();
    let channel = params
        .get(req, "ch")
        .and_then(|p| p.as_str())
        .and_then(|s| s.parse::<u8>().ok())
        .unwrap_or(0);

    log::info!("Apply ssid={:?} ch={} dhcp={}", ssid, channel, dhcp);

    let mut page = Page::new("Saved");
    page.paragraph(&format!("Joining {} on channel {}", ssid, channel))
        .button("/", "Back");
    page.finish(res)
}

fn api_wifi(res: &mut Responder<'_>, req: &Request<'_>) -> Result<()> {
    let mut params = Params::new();

    let ssid = params
        .json(req, "ssid")
        .and_then(|p| p.as_str())
        .map(str::to_string)
        .ok_or(Error::Handler("json body needs ssid"))?;

    let on = params
        .json(req, "on")
        .map(|p| p.as_bytes() == b"true")
        .unwrap_or(true);

    let body = format!("{{\"ssid\":{:?},\"on\":{}}}", ssid, on);
    res.ok("application/json", body.as_bytes())
}

fn upload(res: &mut Responder<'_>, _req: &Request<'_>) -> Result<()> {
    let mut page = Page::new("Firmware");
    page.form("/fw/upload", "post", wisp::page::MULTIPART)
        .file_input("fw", "Image")
        .submit("Upload")
        .end_form();
    page.finish(res)
}

fn fw_upload(res: &mut Responder<'_>, req: &Request<'_>) -> Result<()> {
    let Some(part) = get_file(req, "fw") else {
        return res.respond(StatusCode::BAD_REQUEST, "text/plain", b"no fw part\r\n", "");
    };

    log::info!(
        "Received {} ({} bytes, {:?})",
        part.filename,
        part.data.len(),
        part.content_type
    );

    let mut page = Page::new("Firmware");
    page.paragraph(&format!("{}: {} bytes", part.filename, part.data.len()))
        .button("/", "Back");
    page.finish(res)
}

fn main() -> Result<()> {
    env_logger::init();

    let addr = env::args().nth(1).unwrap_or_else(|| "127.0.0.1:8080".to_string());

    let router = Router::new()
        .get("/", index)
        .post("/wifi/apply", wifi_apply)
        .post("/api/wifi", api_wifi)
        .get("/upload", upload)
        .post("/fw/upload", fw_upload)
        .any("/echo", wisp::router::echo);

    let acceptor = TcpAcceptor::new(addr.as_str())?.with_timeout(Duration::from_secs(2));

    let config = Config {
        recv_buffer: 8 * 1024,
        header_buffer: 512,
        ..Config::default()
    };

    let mut server = Server::bind(acceptor, Host, router, config)?;
    server.run();

    Ok(())
}
