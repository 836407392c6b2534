use std::fs;
use std::io::{Cursor, Read};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use rax_file_manager::auth::AdminCredentials;
use rax_file_manager::{Server, ServerConfig};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use tempfile::TempDir;

const USER: &str = "admin";
const PASSWORD: &str = "correct horse";

struct TestServer {
    addr: SocketAddr,
    temp: TempDir,
    client: Client,
}

impl TestServer {
    fn root(&self) -> PathBuf {
        self.temp.path().join("root")
    }

    fn archives(&self) -> PathBuf {
        self.temp.path().join("archives")
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.client.get(self.url(path)).basic_auth(USER, Some(PASSWORD))
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.client.post(self.url(path)).basic_auth(USER, Some(PASSWORD))
    }

    async fn action(&self, body: Value) -> reqwest::Response {
        self.post("/api/action").json(&body).send().await.unwrap()
    }

    async fn list(&self, path: &str) -> Vec<Value> {
        let response = self
            .get("/api/files")
            .query(&[("path", path)])
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        response.json().await.unwrap()
    }
}

// Helper to start a server on an ephemeral port over a fresh directory tree
async fn start_server(with_frontend: bool) -> TestServer {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("root");
    fs::create_dir_all(root.join("docs")).unwrap();
    fs::create_dir_all(temp.path().join("archives")).unwrap();

    let static_dir = temp.path().join("static");
    if with_frontend {
        fs::create_dir_all(static_dir.join("assets")).unwrap();
        fs::write(static_dir.join("index.html"), "<html>file manager</html>").unwrap();
        fs::write(static_dir.join("assets/app.js"), "console.log(1)").unwrap();
    }

    let config = ServerConfig {
        bind_address: "127.0.0.1".into(),
        port: 0,
        base_dir: root,
        static_dir,
        temp_dir: Some(temp.path().join("archives")),
        admin: AdminCredentials::new(USER, PASSWORD),
    };

    let server = Server::bind(config).await.unwrap();
    let addr = server.local_addr().unwrap();
    tokio::spawn(server.run_until(std::future::pending()));

    TestServer {
        addr,
        temp,
        client: Client::new(),
    }
}

fn names(entries: &[Value]) -> Vec<&str> {
    entries
        .iter()
        .map(|e| e["name"].as_str().unwrap())
        .collect()
}

async fn wait_until_empty(dir: &Path) -> bool {
    for _ in 0..100 {
        if fs::read_dir(dir).unwrap().next().is_none() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    false
}

#[tokio::test]
async fn test_requests_without_credentials_are_rejected() {
    let server = start_server(false).await;

    let response = server
        .client
        .get(server.url("/api/files"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(response.headers()["www-authenticate"], "Basic");

    let response = server
        .client
        .post(server.url("/api/login"))
        .basic_auth(USER, Some("wrong"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["detail"], "Incorrect username or password");

    let response = server
        .client
        .post(server.url("/api/login"))
        .basic_auth("root", Some(PASSWORD))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login() {
    let server = start_server(false).await;

    let response = server.post("/api/login").send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({ "status": "authenticated" }));
}

#[tokio::test]
async fn test_listing_orders_directories_first() {
    let server = start_server(false).await;
    let root = server.root();
    fs::create_dir(root.join("Zeta")).unwrap();
    fs::write(root.join("b.txt"), b"bb").unwrap();
    fs::write(root.join("A.txt"), b"a").unwrap();

    let entries = server.list("/").await;
    assert_eq!(names(&entries), ["docs", "Zeta", "A.txt", "b.txt"]);

    let file = &entries[3];
    assert_eq!(file["is_dir"], false);
    assert_eq!(file["size"], 2);
    assert_eq!(file["path"], "/b.txt");
    assert_eq!(entries[0]["path"], "/docs");
    assert_eq!(entries[0]["size"], 0);

    // No path lists the base directory
    let response = server.get("/api/files").send().await.unwrap();
    let entries: Vec<Value> = response.json().await.unwrap();
    assert_eq!(entries.len(), 4);
}

#[tokio::test]
async fn test_listing_errors() {
    let server = start_server(false).await;
    fs::write(server.root().join("plain.txt"), b"x").unwrap();

    let response = server
        .get("/api/files")
        .query(&[("path", "/missing")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = server
        .get("/api/files")
        .query(&[("path", "/plain.txt")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_path_traversal_is_forbidden() {
    let server = start_server(false).await;
    fs::write(server.temp.path().join("secret.txt"), b"secret").unwrap();

    for path in ["../", "../secret.txt", "/docs/../../secret.txt"] {
        let response = server
            .get("/api/files")
            .query(&[("path", path)])
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN, "listing {path}");

        let response = server
            .get("/api/download")
            .query(&[("path", path)])
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN, "downloading {path}");
    }

    let response = server
        .action(json!({ "action": "delete", "source_path": "../secret.txt" }))
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["detail"], "Access denied");
    assert!(server.temp.path().join("secret.txt").exists());
}

#[cfg(unix)]
#[tokio::test]
async fn test_symlink_escape_is_forbidden() {
    let server = start_server(false).await;
    fs::write(server.temp.path().join("outside.txt"), b"outside").unwrap();
    std::os::unix::fs::symlink(server.temp.path(), server.root().join("escape")).unwrap();

    let response = server
        .get("/api/download")
        .query(&[("path", "/escape/outside.txt")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_upload_then_download_round_trip() {
    let server = start_server(false).await;
    let payload: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();

    // File part first, the way the front-end sends it
    let form = Form::new()
        .part(
            "file",
            Part::bytes(payload.clone()).file_name("blob.bin"),
        )
        .text("path", "/docs");
    let response = server.post("/api/upload").multipart(form).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({ "info": "saved" }));
    assert_eq!(fs::read(server.root().join("docs/blob.bin")).unwrap(), payload);

    let response = server
        .get("/api/download")
        .query(&[("path", "/docs/blob.bin")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["content-type"],
        "application/octet-stream"
    );
    assert_eq!(
        response.headers()["content-disposition"],
        "attachment; filename=\"blob.bin\""
    );
    assert_eq!(response.bytes().await.unwrap().as_ref(), payload.as_slice());

    // Staged upload files never linger
    assert!(wait_until_empty(&server.archives()).await);
}

#[tokio::test]
async fn test_upload_replaces_existing_file() {
    let server = start_server(false).await;
    fs::write(server.root().join("notes.txt"), b"old").unwrap();

    let form = Form::new()
        .text("path", "/")
        .part("file", Part::bytes(b"new".to_vec()).file_name("notes.txt"));
    let response = server.post("/api/upload").multipart(form).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(fs::read(server.root().join("notes.txt")).unwrap(), b"new");
}

#[tokio::test]
async fn test_upload_rejections() {
    let server = start_server(false).await;

    let form = Form::new()
        .text("path", "/docs")
        .part("file", Part::bytes(b"x".to_vec()).file_name("../evil.txt"));
    let response = server.post("/api/upload").multipart(form).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(!server.root().join("evil.txt").exists());

    let form = Form::new()
        .text("path", "/nowhere")
        .part("file", Part::bytes(b"x".to_vec()).file_name("a.txt"));
    let response = server.post("/api/upload").multipart(form).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let form = Form::new().part("file", Part::bytes(b"x".to_vec()).file_name("a.txt"));
    let response = server.post("/api/upload").multipart(form).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = server
        .post("/api/upload")
        .header("content-type", "application/json")
        .body(r#"{"path": "/docs"}"#)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert!(body["detail"].is_string());

    let form = Form::new()
        .text("path", "../")
        .part("file", Part::bytes(b"x".to_vec()).file_name("a.txt"));
    let response = server.post("/api/upload").multipart(form).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(!server.temp.path().join("a.txt").exists());

    assert!(wait_until_empty(&server.archives()).await);
}

#[tokio::test]
async fn test_directory_download_is_zipped_and_cleaned_up() {
    let server = start_server(false).await;
    let docs = server.root().join("docs");
    fs::create_dir_all(docs.join("nested")).unwrap();
    fs::write(docs.join("readme.md"), b"# readme").unwrap();
    fs::write(docs.join("nested/data.csv"), b"a,b\n1,2\n").unwrap();

    let response = server
        .get("/api/download")
        .query(&[("path", "/docs")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "application/zip");
    assert_eq!(
        response.headers()["content-disposition"],
        "attachment; filename=\"docs.zip\""
    );
    let bytes = response.bytes().await.unwrap();

    let mut zip = zip::ZipArchive::new(Cursor::new(bytes.to_vec())).unwrap();
    let mut entries: Vec<String> = zip.file_names().map(str::to_string).collect();
    entries.sort();
    assert_eq!(entries, ["nested/", "nested/data.csv", "readme.md"]);

    let mut csv = String::new();
    zip.by_name("nested/data.csv")
        .unwrap()
        .read_to_string(&mut csv)
        .unwrap();
    assert_eq!(csv, "a,b\n1,2\n");

    assert!(wait_until_empty(&server.archives()).await);
}

#[tokio::test]
async fn test_concurrent_directory_downloads() {
    let server = start_server(false).await;
    fs::write(server.root().join("docs/one.txt"), b"1").unwrap();

    let requests = (0..4).map(|_| async {
        let response = server
            .get("/api/download")
            .query(&[("path", "/docs")])
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        response.bytes().await.unwrap()
    });
    let bodies = futures_util::future::join_all(requests).await;

    for body in bodies {
        let zip = zip::ZipArchive::new(Cursor::new(body.to_vec())).unwrap();
        assert_eq!(zip.len(), 1);
    }
    assert!(wait_until_empty(&server.archives()).await);
}

#[tokio::test]
async fn test_download_missing_path() {
    let server = start_server(false).await;

    let response = server
        .get("/api/download")
        .query(&[("path", "/docs/nothing.txt")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = response.json().await.unwrap();
    assert!(body["detail"].is_string());

    // `path` is required
    let response = server.get("/api/download").send().await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_copy_move_delete() {
    let server = start_server(false).await;
    let root = server.root();
    fs::write(root.join("docs/report.txt"), b"q3").unwrap();

    let response = server
        .action(json!({ "action": "create_folder", "source_path": "/", "dest_path": "backup" }))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.json::<Value>().await.unwrap()["status"], "created");
    assert!(root.join("backup").is_dir());

    let response = server
        .action(json!({ "action": "copy", "source_path": "/docs", "dest_path": "/backup" }))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.json::<Value>().await.unwrap()["status"], "success");
    assert_eq!(fs::read(root.join("backup/docs/report.txt")).unwrap(), b"q3");

    // Copying onto an existing target never merges
    let response = server
        .action(json!({ "action": "copy", "source_path": "/docs", "dest_path": "/backup" }))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = server
        .action(json!({ "action": "move", "source_path": "/docs/report.txt", "dest_path": "/" }))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(root.join("report.txt").exists());
    assert!(!root.join("docs/report.txt").exists());

    let response = server
        .action(json!({ "action": "delete", "source_path": "/backup" }))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.json::<Value>().await.unwrap()["status"], "deleted");
    assert!(!root.join("backup").exists());

    assert_eq!(names(&server.list("/").await), ["docs", "report.txt"]);
}

#[tokio::test]
async fn test_invalid_actions() {
    let server = start_server(false).await;
    fs::create_dir_all(server.root().join("docs/inner")).unwrap();

    let cases = [
        json!({ "action": "move", "source_path": "/docs", "dest_path": "/docs" }),
        json!({ "action": "move", "source_path": "/docs", "dest_path": "/docs/inner" }),
        json!({ "action": "copy", "source_path": "/docs", "dest_path": "/docs/inner" }),
        json!({ "action": "move", "source_path": "/docs" }),
        json!({ "action": "create_folder", "source_path": "/docs" }),
        json!({ "action": "delete", "source_path": "/" }),
        json!({ "action": "chmod", "source_path": "/docs" }),
    ];
    for body in cases {
        let response = server.action(body.clone()).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{body}");
    }

    let response = server
        .action(json!({ "action": "move", "source_path": "/docs", "dest_path": "/gone" }))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = server
        .action(json!({ "action": "delete", "source_path": "/gone" }))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = server
        .action(json!({ "action": "create_folder", "source_path": "/docs", "dest_path": "../../out" }))
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    assert!(server.root().join("docs/inner").is_dir());
    assert!(!server.temp.path().join("out").exists());
}

#[tokio::test]
async fn test_frontend_served_for_unknown_routes() {
    let server = start_server(true).await;

    let response = server.client.get(server.url("/")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await.unwrap(), "<html>file manager</html>");

    let response = server
        .client
        .get(server.url("/browse/photos"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await.unwrap(), "<html>file manager</html>");

    let response = server
        .client
        .get(server.url("/assets/app.js"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await.unwrap(), "console.log(1)");
}

#[tokio::test]
async fn test_missing_frontend_is_json_404() {
    let server = start_server(false).await;

    let response = server.client.get(server.url("/")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({ "message": "Frontend not found" }));

    let response = server
        .client
        .get(server.url("/some/deep/route"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cors_echoes_origin() {
    let server = start_server(false).await;

    let response = server
        .client
        .request(reqwest::Method::OPTIONS, server.url("/api/files"))
        .header("Origin", "http://localhost:5173")
        .header("Access-Control-Request-Method", "GET")
        .header("Access-Control-Request-Headers", "authorization")
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
    assert_eq!(
        response.headers()["access-control-allow-origin"],
        "http://localhost:5173"
    );
    assert_eq!(
        response.headers()["access-control-allow-credentials"],
        "true"
    );
}
