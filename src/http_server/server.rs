//! local admin page
//! actix-web runs on its own thread with its own system; requests the loop must
//! act on are handed over through a channel drained by `handle_client`

use std::sync::{mpsc, Mutex};
use std::thread;

use actix_web::{get, post, web, App, HttpResponse, HttpServer, Responder};

use crate::common::error::{ErrorCode, PropError};
use crate::driver::traits::admin::{AdminPage, AdminRequest, AdminServer};
use crate::{error, info};

const LOG_TAG: &str = "http_server";

const ADMIN_THREAD_NAME: &str = "ee_prop_admin";

const INDEX_HTML: &str = r#"<a href="/update"> UPDATE </a>"#;

pub struct AdminState {
    page: AdminPage,
    requests: Mutex<mpsc::Sender<AdminRequest>>,
}

#[get("/")]
async fn index() -> impl Responder {
    HttpResponse::Ok().content_type("text/html").body(INDEX_HTML)
}

#[get("/update")]
async fn update(state: web::Data<AdminState>) -> impl Responder {
    let page = &state.page;
    let body = format!(
        "<h1>{}</h1>\
         <p>version: {}</p>\
         <p>id: {}</p>\
         <form method=\"POST\" action=\"/reboot\"><input type=\"submit\" value=\"Reboot\"></form>",
        page.name, page.version, page.id
    );
    HttpResponse::Ok().content_type("text/html").body(body)
}

#[post("/reboot")]
async fn reboot(state: web::Data<AdminState>) -> impl Responder {
    let sent = match state.requests.lock() {
        Ok(tx) => tx.send(AdminRequest::Reboot).is_ok(),
        Err(_) => false,
    };
    if sent {
        info!(LOG_TAG, "reboot requested");
        HttpResponse::Ok().content_type("text/html").body("rebooting...")
    } else {
        error!(LOG_TAG, "reboot request lost, prop is gone");
        HttpResponse::ServiceUnavailable().finish()
    }
}

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(index).service(update).service(reboot);
}

pub struct HttpAdminServer {
    host: String,
    port: u16,
    requests_tx: mpsc::Sender<AdminRequest>,
    requests_rx: mpsc::Receiver<AdminRequest>,
    handle: Option<thread::JoinHandle<()>>,
}

impl HttpAdminServer {
    pub fn new(host: &str, port: u16) -> Self {
        let (requests_tx, requests_rx) = mpsc::channel();
        HttpAdminServer {
            host: host.to_string(),
            port,
            requests_tx,
            requests_rx,
            handle: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().map(|h| !h.is_finished()).unwrap_or(false)
    }

    fn app_state(&self, page: AdminPage) -> web::Data<AdminState> {
        web::Data::new(AdminState {
            page,
            requests: Mutex::new(self.requests_tx.clone()),
        })
    }
}

impl AdminServer for HttpAdminServer {
    /// bind and serve in the background, returns once the socket is bound
    fn begin(&mut self, page: AdminPage) -> Result<(), PropError> {
        let data = self.app_state(page);
        let host = self.host.clone();
        let port = self.port;
        let (ready_tx, ready_rx) = mpsc::channel::<Result<(), String>>();

        let handle = thread::Builder::new()
            .name(ADMIN_THREAD_NAME.to_string())
            .spawn(move || {
                let ret = actix_web::rt::System::new().block_on(async move {
                    let server = HttpServer::new(move || App::new().app_data(data.clone()).configure(routes))
                        .workers(1)
                        .bind((host.as_str(), port));
                    match server {
                        Ok(server) => {
                            let _ = ready_tx.send(Ok(()));
                            server.run().await
                        }
                        Err(e) => {
                            let _ = ready_tx.send(Err(e.to_string()));
                            Ok(())
                        }
                    }
                });
                if let Err(e) = ret {
                    error!(LOG_TAG, "admin page stopped, error msg: {}", e);
                }
            })
            .map_err(|e| PropError {
                code: ErrorCode::HttpError,
                msg: format!("cannot spawn admin page thread: {e}"),
            })?;

        match ready_rx.recv() {
            Ok(Ok(())) => {
                info!(LOG_TAG, "admin page listening on {}:{}", self.host, self.port);
                self.handle = Some(handle);
                Ok(())
            }
            Ok(Err(e)) => Err(PropError {
                code: ErrorCode::HttpError,
                msg: format!("cannot bind admin page to {}:{}: {}", self.host, self.port, e),
            }),
            Err(_) => Err(PropError {
                code: ErrorCode::HttpError,
                msg: "admin page thread exited before binding".to_string(),
            }),
        }
    }

    fn handle_client(&mut self) -> Vec<AdminRequest> {
        self.requests_rx.try_iter().collect()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::test as actix_test;

    fn page() -> AdminPage {
        AdminPage {
            name: "Lock1".to_string(),
            version: "2.0".to_string(),
            id: "ABCDEF".to_string(),
        }
    }

    #[actix_web::test]
    async fn test_index_links_to_update() {
        let server = HttpAdminServer::new("127.0.0.1", 0);
        let app = actix_test::init_service(App::new().app_data(server.app_state(page())).configure(routes)).await;

        let req = actix_test::TestRequest::get().uri("/").to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = actix_test::read_body(resp).await;
        assert_eq!(body.as_ref(), INDEX_HTML.as_bytes());
    }

    #[actix_web::test]
    async fn test_update_page_shows_identity() {
        let server = HttpAdminServer::new("127.0.0.1", 0);
        let app = actix_test::init_service(App::new().app_data(server.app_state(page())).configure(routes)).await;

        let req = actix_test::TestRequest::get().uri("/update").to_request();
        let body = actix_test::call_and_read_body(&app, req).await;
        let body = String::from_utf8(body.to_vec()).unwrap();
        assert!(body.contains("Lock1"));
        assert!(body.contains("version: 2.0"));
        assert!(body.contains("id: ABCDEF"));
        assert!(body.contains("action=\"/reboot\""));
    }

    #[actix_web::test]
    async fn test_reboot_is_handed_to_the_loop() {
        let mut server = HttpAdminServer::new("127.0.0.1", 0);
        let app = actix_test::init_service(App::new().app_data(server.app_state(page())).configure(routes)).await;
        assert!(server.handle_client().is_empty());

        let req = actix_test::TestRequest::post().uri("/reboot").to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        assert_eq!(server.handle_client(), vec![AdminRequest::Reboot]);
        assert!(server.handle_client().is_empty());
    }

    #[test]
    fn test_begin_reports_bind_failure() {
        let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = taken.local_addr().unwrap().port();
        let mut server = HttpAdminServer::new("127.0.0.1", port);
        let err = server.begin(page()).unwrap_err();
        assert_eq!(err.code, ErrorCode::HttpError);
        assert!(!server.is_running());
    }
}
