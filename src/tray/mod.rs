use crate::shutdown::{ShutdownSignal, ShutdownTrigger};
use anyhow::Result;
use std::fs;
use std::path::Path;
use tokio::runtime::Handle;

#[cfg(windows)]
mod win32;

pub const TITLE: &str = "cybersonicd";

const DEFAULT_ICON_SIZE: u32 = 32;

/// Decoded RGBA pixels for the tray icon.
#[derive(Debug, Clone)]
pub struct IconImage {
    pub rgba: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Reads the icon at `path`, drawing a built-in one if it is missing or
/// cannot be decoded.
pub fn load_icon(path: &Path) -> IconImage {
    let decoded = fs::read(path)
        .map_err(anyhow::Error::from)
        .and_then(|data| decode_icon(&data));
    match decoded {
        Ok(icon) => icon,
        Err(err) => {
            tracing::warn!(
                path = %path.display(),
                error = %err,
                "Failed to load icon, using default"
            );
            default_icon()
        }
    }
}

pub fn decode_icon(data: &[u8]) -> Result<IconImage> {
    let img = image::load_from_memory(data)?;
    let rgba = img.to_rgba8();
    let (width, height) = (rgba.width(), rgba.height());
    Ok(IconImage {
        rgba: rgba.into_raw(),
        width,
        height,
    })
}

/// A small speaker on a dark tile.
pub fn default_icon() -> IconImage {
    let size = DEFAULT_ICON_SIZE;
    let mut rgba = Vec::with_capacity((size * size * 4) as usize);

    for y in 0..size {
        for x in 0..size {
            let in_border = x < 2 || x >= size - 2 || y < 2 || y >= size - 2;
            let in_body = (7..13).contains(&x) && (12..20).contains(&y);
            // cone widens by one pixel per column
            let spread = x.saturating_sub(13);
            let in_cone = (13..20).contains(&x) && y + spread >= 12 && y <= 19 + spread;
            let in_wave = x == 23 && (10..22).contains(&y);

            if in_border {
                rgba.extend_from_slice(&[60, 60, 70, 255]);
            } else if in_body || in_cone {
                rgba.extend_from_slice(&[0, 200, 220, 255]);
            } else if in_wave {
                rgba.extend_from_slice(&[0, 140, 160, 255]);
            } else {
                rgba.extend_from_slice(&[25, 25, 30, 255]);
            }
        }
    }

    IconImage {
        rgba,
        width: size,
        height: size,
    }
}

/// Runs the tray on the calling thread until shutdown is signalled.
///
/// Quit fires `trigger` and returns once the signal is observed; releasing
/// resources is left to the caller. Platforms without tray support just wait
/// for the signal.
pub fn run(icon_path: &Path, trigger: ShutdownTrigger, signal: ShutdownSignal, runtime: &Handle) {
    #[cfg(windows)]
    {
        match win32::run(load_icon(icon_path), &trigger, &signal) {
            Ok(()) => return,
            Err(err) => {
                tracing::warn!(error = %err, "System tray unavailable, running headless");
            }
        }
    }

    #[cfg(not(windows))]
    {
        let _ = icon_path;
        tracing::warn!(
            "System tray not supported on this platform, running headless; \
             no Quit action, stop the daemon externally"
        );
    }

    drop(trigger);
    runtime.block_on(signal.wait());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shutdown;
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(width, height, image::Rgba([255, 0, 0, 255]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_decode_icon() {
        let icon = decode_icon(&png_bytes(16, 24)).unwrap();
        assert_eq!((icon.width, icon.height), (16, 24));
        assert_eq!(icon.rgba.len(), 16 * 24 * 4);
        assert_eq!(&icon.rgba[..4], &[255, 0, 0, 255]);
    }

    #[test]
    fn test_decode_garbage_icon_fails() {
        assert!(decode_icon(b"not an image").is_err());
    }

    #[test]
    fn test_load_icon_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        let icon = load_icon(&dir.path().join("tray.ico"));
        assert_eq!((icon.width, icon.height), (DEFAULT_ICON_SIZE, DEFAULT_ICON_SIZE));
        assert_eq!(icon.rgba.len(), (DEFAULT_ICON_SIZE * DEFAULT_ICON_SIZE * 4) as usize);
    }

    #[test]
    fn test_load_icon_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tray.png");
        fs::write(&path, png_bytes(8, 8)).unwrap();
        let icon = load_icon(&path);
        assert_eq!((icon.width, icon.height), (8, 8));
    }

    #[cfg(not(windows))]
    #[test]
    fn test_headless_run_returns_on_shutdown() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let (trigger, signal) = shutdown::channel();
        let remote = trigger.clone();
        let quitter = std::thread::spawn(move || {
            std::thread::sleep(std::time::Duration::from_millis(20));
            remote.trigger();
        });
        run(Path::new("missing.ico"), trigger, signal, runtime.handle());
        quitter.join().unwrap();
    }

    #[cfg(not(windows))]
    #[test]
    fn test_headless_run_warns() {
        use std::sync::{Arc, Mutex};

        #[derive(Clone, Default)]
        struct Captured(Arc<Mutex<Vec<u8>>>);

        impl std::io::Write for Captured {
            fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
                self.0.lock().unwrap().extend_from_slice(buf);
                Ok(buf.len())
            }

            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_max_level(tracing::Level::WARN)
            .with_writer(move || writer.clone())
            .finish();

        let runtime = tokio::runtime::Runtime::new().unwrap();
        let (trigger, signal) = shutdown::channel();
        trigger.trigger();
        tracing::subscriber::with_default(subscriber, || {
            run(Path::new("missing.ico"), trigger, signal, runtime.handle());
        });

        let logs = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(logs.contains("WARN"), "{}", logs);
        assert!(logs.contains("running headless"), "{}", logs);
    }
}
