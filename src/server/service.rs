//! Module with the service that implements ALL the functionality.

use std::convert::Infallible;
use std::hash::Hash;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use hyper::{Body, Method, Request, Response, StatusCode};
use hyper::header::{HeaderValue, CACHE_CONTROL, CONTENT_LENGTH, CONTENT_TYPE};
use quip::{is_artifact_id, FileStorage, ThreadSafeCache, ARTIFACT_EXTENSION};
use serde_json::{json, Value as Json};

use crate::handlers::{caption_meme, Captioner};
use crate::handlers::list::{find_template, list_templates};
use crate::handlers::util::{bytes_response, content_type, empty_response, error_response,
                            json_response};


/// Path prefix of stored artifacts.
const GENERATED_PREFIX: &'static str = "/generated/";
/// Path prefix of single template lookups.
const TEMPLATE_PREFIX: &'static str = "/templates/";


#[derive(Clone)]
pub struct Quip {
    captioner: Arc<Captioner>,
    artifacts: Arc<FileStorage>,
}

impl Quip {
    pub fn new(captioner: Arc<Captioner>, artifacts: FileStorage) -> Self {
        Quip{captioner, artifacts: Arc::new(artifacts)}
    }
}

impl Quip {
    /// Serve a single HTTP request, coming from given remote address.
    pub async fn call(self, remote: SocketAddr,
                      req: Request<Body>) -> Result<Response<Body>, Infallible> {
        let start = Instant::now();
        let log_line = format!("{} {} {}{} {:?}",
            remote.ip(),
            req.method().as_str().to_uppercase(),
            req.uri().path(),
            req.uri().query().map(|q| format!("?{}", q)).unwrap_or_else(String::new),
            req.version());

        let mut resp = self.handle(req).await;
        Self::fix_headers(&mut resp);

        let elapsed = start.elapsed().as_secs_f64();
        info!("{} - HTTP {}", log_line, resp.status().as_u16());
        debug!("HTTP {status}, produced {len} bytes of {ctype} in {time:.3} secs",
            status = resp.status(),
            len = resp.headers().get(CONTENT_LENGTH)
                .and_then(|v| v.to_str().ok()).unwrap_or("unknown number of"),
            ctype = resp.headers().get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok()).unwrap_or("unknown content"),
            time = elapsed);
        Ok(resp)
    }

    async fn handle(&self, req: Request<Body>) -> Response<Body> {
        let method = req.method().clone();
        let path = req.uri().path().to_owned();
        match (&method, path.as_str()) {
            (_, "/caption") => self.handle_caption(req).await,
            (&Method::GET, "/templates") => self.handle_list_templates(),
            (&Method::GET, p) if p.starts_with(TEMPLATE_PREFIX) =>
                self.handle_template(&p[TEMPLATE_PREFIX.len()..]),
            (&Method::GET, p) if p.starts_with(GENERATED_PREFIX) =>
                self.handle_artifact(&p[GENERATED_PREFIX.len()..]),
            (&Method::GET, "/stats") => self.handle_stats(),
            (_, "/templates") | (_, "/stats") => self.handle_405(&method, &path),
            _ => self.handle_404(&path),
        }
    }

    fn handle_404(&self, path: &str) -> Response<Body> {
        debug!("Path {} doesn't match any endpoint", path);
        empty_response(StatusCode::NOT_FOUND)
    }

    fn handle_405(&self, method: &Method, path: &str) -> Response<Body> {
        debug!("Method {} not allowed for {}", method, path);
        empty_response(StatusCode::METHOD_NOT_ALLOWED)
    }
}

// Request handlers.
impl Quip {
    /// Handle the meme captioning request.
    async fn handle_caption(&self, request: Request<Body>) -> Response<Body> {
        let (parts, body) = request.into_parts();
        let body = match hyper::body::to_bytes(body).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Failed to read the body of caption request: {}", e);
                return error_response(StatusCode::BAD_REQUEST,
                    "Cannot read request", Some(e.to_string()));
            },
        };
        caption_meme(&self.captioner, &parts.method, &parts.uri, &body).await
    }

    /// Handle the template listing request.
    fn handle_list_templates(&self) -> Response<Body> {
        let templates = list_templates(self.captioner.pipeline().catalog());
        json_response(json!(templates))
    }

    /// Handle the request for a single template.
    fn handle_template(&self, id: &str) -> Response<Body> {
        match find_template(self.captioner.pipeline().catalog(), id) {
            Some(template) => json_response(json!(template)),
            None => error_response(StatusCode::NOT_FOUND, "Meme template not found",
                Some(format!("meme template `{}` not found", id))),
        }
    }

    /// Handle the request for a rendered image.
    fn handle_artifact(&self, file: &str) -> Response<Body> {
        let suffix = format!(".{}", ARTIFACT_EXTENSION);
        let id = match file.strip_suffix(suffix.as_str()) {
            Some(id) if is_artifact_id(id) => id,
            _ => {
                debug!("Invalid artifact file name: {}", file);
                return empty_response(StatusCode::NOT_FOUND);
            },
        };
        match self.artifacts.read(id) {
            Ok(bytes) => {
                trace!("Serving {} byte(s) of artifact {}", bytes.len(), id);
                bytes_response(&mime::IMAGE_JPEG, bytes)
            },
            Err(ref e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("Artifact {} not found", id);
                empty_response(StatusCode::NOT_FOUND)
            },
            Err(e) => {
                error!("Failed to read artifact {}: {}", id, e);
                error_response(StatusCode::INTERNAL_SERVER_ERROR,
                    "Cannot read the image", Some(e.to_string()))
            },
        }
    }

    /// Handle the server statistics request.
    fn handle_stats(&self) -> Response<Body> {
        let stats = json!({
            "templates": self.captioner.pipeline().catalog().len(),
            "generator": self.captioner.pipeline().has_generator(),
            "cache": {
                "templates": self.captioner.template_cache().map(cache_stats),
                "fonts": self.captioner.font_cache().map(cache_stats),
            }
        });
        return json_response(stats);

        fn cache_stats<K: Eq + Hash, V>(cache: &ThreadSafeCache<K, V>) -> Json {
            let capacity = cache.capacity();
            json!({
                "capacity": capacity,
                "fill_rate": cache.len() as f32 / capacity.max(1) as f32,
                "misses": cache.misses(),
                "hits": cache.hits(),
            })
        }
    }
}

impl Quip {
    /// Fix headers in the response, providing default values where necessary.
    fn fix_headers(resp: &mut Response<Body>) {
        if !resp.headers().contains_key(CONTENT_TYPE) {
            resp.headers_mut().insert(CONTENT_TYPE, content_type(&mime::APPLICATION_OCTET_STREAM));
        }
        // Rendered images never change, but everything else might.
        if !resp.headers().contains_key(CACHE_CONTROL) {
            let is_image = resp.headers().get(CONTENT_TYPE)
                .map(|ct| ct == mime::IMAGE_JPEG.as_ref()).unwrap_or(false);
            let value = if is_image && resp.status() == StatusCode::OK {
                "public, max-age=31536000, immutable"
            } else {
                "no-cache"
            };
            resp.headers_mut().insert(CACHE_CONTROL, HeaderValue::from_static(value));
        }
    }
}


#[cfg(test)]
mod tests {
    use std::net::SocketAddr;
    use std::sync::Arc;
    use hyper::{Body, Method, Request, Response, StatusCode};
    use hyper::header::{CACHE_CONTROL, CONTENT_TYPE};
    use quip::FileStorage;
    use serde_json::Value as Json;
    use tempfile::TempDir;
    use crate::handlers::Captioner;
    use crate::testing::pipeline;
    use super::Quip;

    fn service(dir: &TempDir) -> Quip {
        let captioner = Captioner::new(pipeline(dir), Some(1)).unwrap();
        Quip::new(Arc::new(captioner), FileStorage::new(dir.path().join("generated"), "/generated"))
    }

    async fn request(service: &Quip, method: Method, uri: &str, body: &str) -> Response<Body> {
        let req = Request::builder().method(method).uri(uri)
            .body(Body::from(body.to_owned())).unwrap();
        let remote: SocketAddr = "127.0.0.1:4242".parse().unwrap();
        service.clone().call(remote, req).await.unwrap()
    }

    async fn body_bytes(response: Response<Body>) -> Vec<u8> {
        hyper::body::to_bytes(response.into_body()).await.unwrap().to_vec()
    }

    #[tokio::test]
    async fn list_templates() {
        let dir = TempDir::new().unwrap();
        let response = request(&service(&dir), Method::GET, "/templates", "").await;
        assert_eq!(StatusCode::OK, response.status());

        let json: Json = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(1, json.as_array().unwrap().len());
        assert_eq!("blank", json[0]["id"]);
        assert!(json[0].get("template_url").is_none());
    }

    #[tokio::test]
    async fn single_template() {
        let dir = TempDir::new().unwrap();
        let service = service(&dir);
        let response = request(&service, Method::GET, "/templates/blank", "").await;
        assert_eq!(StatusCode::OK, response.status());
        let response = request(&service, Method::GET, "/templates/nope", "").await;
        assert_eq!(StatusCode::NOT_FOUND, response.status());
    }

    #[tokio::test]
    async fn render_and_fetch() {
        let dir = TempDir::new().unwrap();
        let service = service(&dir);
        let response = request(&service, Method::POST, "/caption",
            r#"{"templateId": "blank", "caption": ""}"#).await;
        assert_eq!(StatusCode::OK, response.status());
        assert_eq!("no-cache", response.headers()[CACHE_CONTROL]);

        let json: Json = serde_json::from_slice(&body_bytes(response).await).unwrap();
        let url = json["imageUrl"].as_str().unwrap().to_owned();
        let response = request(&service, Method::GET, &url, "").await;
        assert_eq!(StatusCode::OK, response.status());
        assert_eq!("image/jpeg", response.headers()[CONTENT_TYPE]);
        assert!(response.headers()[CACHE_CONTROL].to_str().unwrap().contains("immutable"));

        let bytes = body_bytes(response).await;
        assert_eq!(&[0xff, 0xd8], &bytes[..2]);
    }

    #[tokio::test]
    async fn artifact_names_are_validated() {
        let dir = TempDir::new().unwrap();
        let service = service(&dir);
        for uri in &["/generated/blank-123.jpg", "/generated/blank.jpg",
                     "/generated/blank-123.png", "/generated/..%2Fcatalog.json"] {
            let response = request(&service, Method::GET, uri, "").await;
            assert_eq!(StatusCode::NOT_FOUND, response.status(), "{}", uri);
        }
    }

    #[tokio::test]
    async fn stats() {
        let dir = TempDir::new().unwrap();
        let response = request(&service(&dir), Method::GET, "/stats", "").await;
        assert_eq!(StatusCode::OK, response.status());

        let json: Json = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(1, json["templates"]);
        assert_eq!(false, json["generator"]);
        assert_eq!(0, json["cache"]["templates"]["hits"]);
    }

    #[tokio::test]
    async fn unknown_routes() {
        let dir = TempDir::new().unwrap();
        let service = service(&dir);
        let response = request(&service, Method::GET, "/nope", "").await;
        assert_eq!(StatusCode::NOT_FOUND, response.status());
        let response = request(&service, Method::DELETE, "/templates", "").await;
        assert_eq!(StatusCode::METHOD_NOT_ALLOWED, response.status());
    }
}
