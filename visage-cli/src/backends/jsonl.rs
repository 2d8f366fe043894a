// JSON-lines backend: one geometry object per frame

use serde::Serialize;
use std::io::{self, Write};
use visage_core::{Error, FaceStyle, Geometry, Renderer, Result};

#[derive(Serialize)]
struct FrameRecord<'a> {
    frame: u64,
    width: u32,
    height: u32,
    geometry: &'a Geometry,
}

pub struct JsonlRenderer<W: Write + Send> {
    out: W,
    size: (u32, u32),
    frames: u64,
    limit: Option<u64>,
}

impl JsonlRenderer<io::Stdout> {
    pub fn stdout(limit: Option<u64>) -> Self {
        Self::new(io::stdout(), limit)
    }
}

impl<W: Write + Send> JsonlRenderer<W> {
    pub fn new(out: W, limit: Option<u64>) -> Self {
        Self {
            out,
            size: (0, 0),
            frames: 0,
            limit,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send> Renderer for JsonlRenderer<W> {
    fn init(&mut self, width: u32, height: u32, _style: &FaceStyle) -> Result<()> {
        self.size = (width, height);
        Ok(())
    }

    fn render(&mut self, geometry: &Geometry, _style: &FaceStyle) -> Result<()> {
        let record = FrameRecord {
            frame: self.frames,
            width: self.size.0,
            height: self.size.1,
            geometry,
        };
        serde_json::to_writer(&mut self.out, &record)
            .map_err(|e| Error::Serialization(e.to_string()))?;
        self.out.write_all(b"\n")?;
        Ok(())
    }

    fn present(&mut self) -> Result<()> {
        self.out.flush()?;
        self.frames += 1;
        Ok(())
    }

    fn handle_events(&mut self) -> bool {
        self.limit.map_or(true, |limit| self.frames < limit)
    }

    fn get_size(&self) -> (u32, u32) {
        self.size
    }

    fn cleanup(&mut self) {
        let _ = self.out.flush();
    }

    fn backend_name(&self) -> &str {
        "jsonl"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use visage_core::{geometry, PoseVector};

    #[test]
    fn test_writes_one_line_per_frame() {
        let style = FaceStyle::default();
        let mut renderer = JsonlRenderer::new(Vec::new(), Some(3));
        renderer.init(800, 600, &style).unwrap();
        let geo = geometry::compute(&PoseVector::neutral(), (800, 600), &style);

        while renderer.handle_events() {
            renderer.render(&geo, &style).unwrap();
            renderer.present().unwrap();
        }

        let out = String::from_utf8(renderer.into_inner()).unwrap();
        let lines: Vec<_> = out.lines().collect();
        assert_eq!(lines.len(), 3);

        let last: serde_json::Value = serde_json::from_str(lines[2]).unwrap();
        assert_eq!(last["frame"], 2);
        assert_eq!(last["width"], 800);
        assert_eq!(last["geometry"]["left_iris"]["kind"], "circle");
        assert!(last["geometry"].get("mouth_interior").is_none());
    }
}
