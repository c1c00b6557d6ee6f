use std::{
    fs::File,
    io::{self, Write},
    path::PathBuf,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};
use tracing_subscriber::EnvFilter;
use webapp_http::{
    limits::ReqLimits, Address, ContentType, HttpFactory, MimeType, Response, Router, Server,
    StatusCode, Storage, StorageGenerator,
};

const FORM: &str = r#"<form method="post" action="/upload" enctype="multipart/form-data">
<input name="title"> <input type="file" name="file"> <button>Send</button>
</form>"#;

/// Writes the upload straight to a temporary file.
struct DiskStorage {
    path: PathBuf,
    file: File,
    size: usize,
}

impl DiskStorage {
    fn create() -> io::Result<Self> {
        static NEXT: AtomicUsize = AtomicUsize::new(0);

        let id = NEXT.fetch_add(1, Ordering::Relaxed);
        let path = std::env::temp_dir().join(format!("upload-{}-{id}", std::process::id()));
        Ok(Self {
            file: File::create(&path)?,
            path,
            size: 0,
        })
    }
}

impl Storage for DiskStorage {
    fn name(&self) -> &str {
        "DiskStorage"
    }

    fn append(&mut self, data: &[u8]) -> io::Result<()> {
        self.file.write_all(data)?;
        self.size += data.len();
        Ok(())
    }

    fn size(&self) -> usize {
        self.size
    }

    fn clear(&mut self) {
        self.size = 0;
        if let Ok(file) = File::create(&self.path) {
            self.file = file;
        }
    }

    fn write_to(&self, out: &mut dyn io::Write) -> io::Result<()> {
        io::copy(&mut File::open(&self.path)?, out).map(|_| ())
    }

    fn clone_box(&self) -> Box<dyn Storage> {
        match DiskStorage::create() {
            Ok(mut copy) => {
                let _ = self.write_to(&mut copy.file);
                copy.size = self.size;
                Box::new(copy)
            }
            Err(_) => Box::new(webapp_http::InMemoryStorage::default()),
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut router = Router::new();
    router
        .add_handler_for("/", |_, _, resp| {
            resp.set_body(FORM);
            true
        })
        .unwrap();
    router
        .add_handler_for("/upload", |_, req, resp| {
            let Some(file) = req.post("file") else {
                resp.set_body("no file").set_status(StatusCode::BadRequest);
                return true;
            };

            let title = req.post("title").and_then(|field| field.value_string());
            resp.set_header(StatusCode::Ok, Response::header_for_json())
                .set_body(format!(
                    r#"{{"title": {:?}, "filename": {:?}, "size": {}, "storage": {:?}}}"#,
                    title.unwrap_or_default(),
                    file.filename(),
                    file.size(),
                    file.storage_name().unwrap_or_default(),
                ));
            true
        })
        .unwrap();

    // Binary parts go to disk, text parts stay in memory.
    let generator: StorageGenerator = Arc::new(|content_type: &ContentType| {
        match content_type.name {
            MimeType::Text | MimeType::Application => None,
            _ => DiskStorage::create()
                .ok()
                .map(|storage| Box::new(storage) as Box<dyn Storage>),
        }
    });

    let mut server = Server::builder()
        .protocol(HttpFactory::new(Arc::new(router)).storage_generator(generator))
        .request_limits(ReqLimits {
            header_line_size: 2048,
            ..ReqLimits::default()
        })
        .build();

    server.bind_to(Address::LOOPBACK, 8080).await.unwrap();
    server.launch().await;
}
