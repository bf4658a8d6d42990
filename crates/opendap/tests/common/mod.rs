//! Loopback HTTP server serving canned DAP responses.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// A canned reply for one request target (path plus query).
#[derive(Clone)]
pub enum Reply {
    Body(u16, String),
    /// Accept the request and never answer.
    Hang,
}

pub struct FixtureServer {
    pub base: String,
    requests: Arc<Mutex<Vec<String>>>,
}

impl FixtureServer {
    pub async fn start(routes: HashMap<String, Reply>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let routes = Arc::new(routes);
        let requests = Arc::new(Mutex::new(Vec::new()));

        let recorded = requests.clone();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let routes = routes.clone();
                let recorded = recorded.clone();
                tokio::spawn(async move {
                    let mut buf = Vec::new();
                    let mut chunk = [0u8; 1024];
                    loop {
                        match socket.read(&mut chunk).await {
                            Ok(0) | Err(_) => return,
                            Ok(n) => buf.extend_from_slice(&chunk[..n]),
                        }
                        if buf.windows(4).any(|w| w == b"\r\n\r\n") {
                            break;
                        }
                    }

                    let head = String::from_utf8_lossy(&buf);
                    let target = percent_decode(head.split_whitespace().nth(1).unwrap_or("/"));
                    recorded.lock().unwrap().push(target.clone());

                    let (status, body) = match routes.get(&target) {
                        Some(Reply::Body(status, body)) => (*status, body.clone()),
                        Some(Reply::Hang) => {
                            tokio::time::sleep(Duration::from_secs(30)).await;
                            return;
                        }
                        None => (404, "not found".to_string()),
                    };

                    let response = format!(
                        "HTTP/1.1 {} Fixture\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                        status,
                        body.len(),
                        body
                    );
                    let _ = socket.write_all(response.as_bytes()).await;
                    let _ = socket.shutdown().await;
                });
            }
        });

        Self { base, requests }
    }

    /// Request targets received so far, in arrival order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

fn percent_decode(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            if let Some(Ok(b)) = s.get(i + 1..i + 3).map(|h| u8::from_str_radix(h, 16)) {
                out.push(b);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

pub const RUN_PATH: &str = "/gfs20240115/gfs_0p25_1hr_00z";

pub const DDS: &str = r#"Dataset {
    Float64 time[time = 2];
    Float64 lat[lat = 3];
    Float64 lon[lon = 4];
    Grid {
     ARRAY:
        Float32 tmp2m[time = 2][lat = 3][lon = 4];
     MAPS:
        Float64 time[time = 2];
        Float64 lat[lat = 3];
        Float64 lon[lon = 4];
    } tmp2m;
} gfs_0p25_1hr_00z;
"#;

pub const DAS: &str = r#"Attributes {
    time {
        String units "days since 1-1-1 00:00:0.0";
    }
    lat {
        String units "degrees_north";
    }
    tmp2m {
        Float32 _FillValue 9.999E20;
        Float32 missing_value 9.999E20;
        String long_name "2 m above ground temperature [k] ";
    }
}
"#;

pub const COORDS: &str = "time, [2]\n738901.0, 738901.0416666667\nlat, [3]\n0.0, 0.25, 0.5\nlon, [4]\n95.0, 95.25, 95.5, 95.75\n";

/// Routes for a complete small run.
pub fn run_routes() -> HashMap<String, Reply> {
    let mut routes = HashMap::new();
    routes.insert(format!("{}.dds", RUN_PATH), Reply::Body(200, DDS.to_string()));
    routes.insert(format!("{}.das", RUN_PATH), Reply::Body(200, DAS.to_string()));
    routes.insert(
        format!("{}.ascii?time,lat,lon", RUN_PATH),
        Reply::Body(200, COORDS.to_string()),
    );
    routes
}
