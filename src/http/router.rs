//! Path-segment trie dispatching completed requests to handlers.

use crate::{
    errors::ErrorKind,
    http::{request::Request, response::Response, types::ContentType},
};
use std::{collections::HashMap, ffi::OsStr, fmt, path::PathBuf, sync::Arc};
use tracing::debug;

/// Route handler.
///
/// Receives the path segments left after the node it is registered at, the
/// request and the response to fill. Returning `false` answers the request
/// with `404 Not Found`.
pub type Handler = Arc<dyn Fn(&[String], &Request, &mut Response) -> bool + Send + Sync>;

#[derive(Default)]
struct Node {
    handler: Option<Handler>,
    children: HashMap<String, Node>,
}

/// Maps request paths onto handlers.
///
/// A request is served by the handler registered at the longest prefix of
/// its path, so a handler at `/api` also receives `/api/users/1` with
/// `["users", "1"]` as the remaining segments.
///
/// # Examples
/// ```
/// use webapp_http::{Request, Response, Router, StatusCode};
///
/// let mut router = Router::new();
/// router
///     .add_handler_for("/hello", |rest, _, resp| {
///         resp.set_body(format!("Hello, {}!", rest.join(" ")));
///         true
///     })
///     .unwrap();
///
/// let mut req = Request::default();
/// req.parse(b"GET /hello/big/world HTTP/1.1\r\n\r\n").unwrap();
///
/// let mut resp = Response::default();
/// assert!(router.call_handler_for(&req, &mut resp));
/// assert_eq!(resp.status(), StatusCode::Ok);
/// assert_eq!(resp.body_size(), "Hello, big world!".len());
/// ```
#[derive(Default)]
pub struct Router {
    root: Node,
    prefix: Vec<String>,
}

impl Router {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Router serving only paths under `root`, which is stripped before
    /// the lookup.
    pub fn with_root(root: &str) -> Self {
        Self {
            root: Node::default(),
            prefix: split_path(root).map(str::to_string).collect(),
        }
    }

    /// Registers `handler` at `path`.
    ///
    /// Empty segments are ignored, so `/a//b/` and `a/b` are the same path.
    /// Fails with [`ErrorKind::HandlerAlreadyExists`] when `path` already
    /// has a handler.
    pub fn add_handler_for<F>(&mut self, path: &str, handler: F) -> Result<(), ErrorKind>
    where
        F: Fn(&[String], &Request, &mut Response) -> bool + Send + Sync + 'static,
    {
        let node = split_path(path).fold(&mut self.root, |node, segment| {
            node.children.entry(segment.to_string()).or_default()
        });

        if node.handler.is_some() {
            return Err(ErrorKind::HandlerAlreadyExists);
        }

        node.handler = Some(Arc::new(handler));
        Ok(())
    }

    /// Serves the regular files under `dir` at `path`.
    ///
    /// The remaining segments of the request name the file. Directories,
    /// missing files and paths stepping out of `dir` are not found. The
    /// content type follows the file extension.
    pub fn add_directory_for<P: Into<PathBuf>>(&mut self, path: &str, dir: P) -> Result<(), ErrorKind> {
        let dir = dir.into();

        self.add_handler_for(path, move |rest, _, resp| {
            if rest.is_empty() || !rest.iter().all(|segment| is_plain_name(segment)) {
                return false;
            }

            let file = rest.iter().fold(dir.clone(), |path, segment| path.join(segment));
            let extension = file.extension().and_then(OsStr::to_str).unwrap_or_default();

            match resp.use_file(ContentType::for_extension(extension), &file) {
                Ok(()) => true,
                Err(err) => {
                    debug!(file = %file.display(), %err, "static file not served");
                    false
                }
            }
        })
    }

    /// Runs the handler registered at the longest prefix of the request
    /// path; `false` when there is none or it declined the request.
    pub fn call_handler_for(&self, req: &Request, resp: &mut Response) -> bool {
        let path = req.uri().path();
        let Some(path) = strip_prefix(path, &self.prefix) else {
            return false;
        };

        let mut node = &self.root;
        let mut found = node.handler.as_ref().map(|handler| (handler, 0));

        for (depth, segment) in path.iter().enumerate() {
            match node.children.get(segment) {
                Some(child) => node = child,
                None => break,
            }

            if let Some(handler) = &node.handler {
                found = Some((handler, depth + 1));
            }
        }

        match found {
            Some((handler, depth)) => handler(&path[depth..], req, resp),
            None => false,
        }
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("prefix", &self.prefix)
            .field("routes", &self.root.count())
            .finish()
    }
}

impl Node {
    fn count(&self) -> usize {
        let own = usize::from(self.handler.is_some());
        own + self.children.values().map(Node::count).sum::<usize>()
    }
}

#[inline]
fn split_path(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|segment| !segment.is_empty())
}

#[inline]
fn strip_prefix<'a>(path: &'a [String], prefix: &[String]) -> Option<&'a [String]> {
    match path.starts_with(prefix) {
        true => Some(&path[prefix.len()..]),
        false => None,
    }
}

// Decoded segments may hold anything, `%2F` included.
#[inline]
fn is_plain_name(segment: &str) -> bool {
    segment != "." && segment != ".." && !segment.contains(['/', '\\', '\0'])
}
