//! Poster and backdrop loading from the image CDN
//!
//! Downloads run on short-lived threads and only hand decoded pixels back;
//! textures are created on the UI thread and kept for the whole session.

use std::collections::HashMap;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::thread;
use std::time::Duration;

use eframe::egui;

const USER_AGENT: &str = concat!("tmdb_catalog/", env!("CARGO_PKG_VERSION"));

pub enum PosterState {
    Loading,
    Ready(egui::TextureHandle),
    Failed,
}

struct Download {
    url: String,
    result: Result<egui::ColorImage, String>,
}

pub struct PosterCache {
    entries: HashMap<String, PosterState>,
    sender: Sender<Download>,
    receiver: Receiver<Download>,
}

impl Default for PosterCache {
    fn default() -> Self {
        Self::new()
    }
}

impl PosterCache {
    pub fn new() -> Self {
        let (sender, receiver) = channel();
        Self { entries: HashMap::new(), sender, receiver }
    }

    pub fn get(&self, url: &str) -> Option<&PosterState> {
        self.entries.get(url)
    }

    /// Start downloading any of `urls` not seen yet this session
    pub fn prefetch<'a>(&mut self, ctx: &egui::Context, urls: impl IntoIterator<Item = &'a str>) {
        for url in urls {
            if self.entries.contains_key(url) {
                continue;
            }
            self.entries.insert(url.to_string(), PosterState::Loading);

            let url = url.to_string();
            let sender = self.sender.clone();
            let ctx = ctx.clone();
            thread::spawn(move || {
                let result = download(&url).and_then(|bytes| decode_poster(&bytes));
                let _ = sender.send(Download { url, result });
                ctx.request_repaint();
            });
        }
    }

    /// Turn finished downloads into textures. Returns (url, error) for failures.
    pub fn poll(&mut self, ctx: &egui::Context) -> Vec<(String, String)> {
        let mut failures = Vec::new();
        while let Ok(done) = self.receiver.try_recv() {
            let state = match done.result {
                Ok(image) => PosterState::Ready(ctx.load_texture(
                    done.url.clone(),
                    image,
                    egui::TextureOptions::LINEAR,
                )),
                Err(e) => {
                    failures.push((done.url.clone(), e));
                    PosterState::Failed
                }
            };
            self.entries.insert(done.url, state);
        }
        failures
    }

    pub fn is_loading(&self) -> bool {
        self.entries.values().any(|s| matches!(s, PosterState::Loading))
    }
}

fn download(url: &str) -> Result<Vec<u8>, String> {
    let agent = ureq::Agent::config_builder()
        .timeout_global(Some(Duration::from_secs(30)))
        .build()
        .new_agent();

    let mut response = agent.get(url)
        .header("User-Agent", USER_AGENT)
        .call()
        .map_err(|e| format!("download failed: {}", e))?;

    response.body_mut()
        .read_to_vec()
        .map_err(|e| format!("read failed: {}", e))
}

/// Decode JPEG/PNG/WebP bytes into an egui image
pub fn decode_poster(bytes: &[u8]) -> Result<egui::ColorImage, String> {
    let image = image::load_from_memory(bytes).map_err(|e| format!("decode failed: {}", e))?;
    let rgba = image.to_rgba8();
    let size = [rgba.width() as usize, rgba.height() as usize];
    Ok(egui::ColorImage::from_rgba_unmultiplied(size, rgba.as_raw()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_decode_png() {
        let img = image::RgbaImage::from_pixel(3, 2, image::Rgba([200, 10, 10, 255]));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png).unwrap();

        let decoded = decode_poster(&bytes).unwrap();
        assert_eq!(decoded.size, [3, 2]);
        assert_eq!(decoded.pixels[0], egui::Color32::from_rgba_unmultiplied(200, 10, 10, 255));
    }

    #[test]
    fn test_decode_garbage() {
        let err = decode_poster(b"<html>404</html>").unwrap_err();
        assert!(err.starts_with("decode failed"));
    }

    #[test]
    fn test_failed_download_reported_once() {
        let ctx = egui::Context::default();
        let mut cache = PosterCache::new();
        // Nothing listens on port 9 locally; the request fails fast
        cache.prefetch(&ctx, ["http://127.0.0.1:9/poster.jpg"]);
        cache.prefetch(&ctx, ["http://127.0.0.1:9/poster.jpg"]);
        assert!(cache.is_loading());

        let mut failures = Vec::new();
        for _ in 0..100 {
            failures.extend(cache.poll(&ctx));
            if !cache.is_loading() {
                break;
            }
            thread::sleep(Duration::from_millis(50));
        }

        assert_eq!(failures.len(), 1);
        assert!(matches!(cache.get("http://127.0.0.1:9/poster.jpg"), Some(PosterState::Failed)));
    }
}
