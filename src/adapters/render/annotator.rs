use ab_glyph::{FontRef, InvalidFont, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;

use crate::application::ports::AnnotatorPort;
use crate::domain::classes::ClassRegistry;
use crate::domain::detection::{BoundingBox, Detection};

static LABEL_FONT: &[u8] = include_bytes!("../../../assets/fonts/DejaVuSans-Bold.ttf");

const PALETTE: [[u8; 3]; 20] = [
    [0xFF, 0x38, 0x38], [0xFF, 0x9D, 0x97], [0xFF, 0x70, 0x1F], [0xFF, 0xB2, 0x1D],
    [0xCF, 0xD2, 0x31], [0x48, 0xF9, 0x0A], [0x92, 0xCC, 0x17], [0x3D, 0xDB, 0x86],
    [0x1A, 0x93, 0x34], [0x00, 0xD4, 0xBB], [0x2C, 0x99, 0xA8], [0x00, 0xC2, 0xFF],
    [0x34, 0x45, 0x93], [0x64, 0x73, 0xFF], [0x00, 0x18, 0xEC], [0x84, 0x38, 0xFF],
    [0x52, 0x00, 0x85], [0xCB, 0x38, 0xFF], [0xFF, 0x95, 0xC8], [0xFF, 0x37, 0xC7],
];

const TEXT_COLOR: Rgb<u8> = Rgb([255, 255, 255]);

pub fn class_color(class_id: usize) -> Rgb<u8> {
    Rgb(PALETTE[class_id % PALETTE.len()])
}

/// Draws a class-coloured outline per detection plus a tab reading `label score`.
#[derive(Clone)]
pub struct BoxAnnotator {
    font: FontRef<'static>,
    registry: ClassRegistry,
}

impl BoxAnnotator {
    pub fn new(registry: ClassRegistry) -> Result<Self, InvalidFont> {
        Ok(Self { font: FontRef::try_from_slice(LABEL_FONT)?, registry })
    }

    /// Line width grows with image size, never below 2px.
    pub fn line_width(width: u32, height: u32) -> u32 {
        (((width + height) as f32 / 2.0 * 0.003).round() as u32).max(2)
    }

    pub fn label_text(&self, det: &Detection) -> String {
        format!("{} {:.2}", self.registry.label(det.class_id).unwrap_or("?"), det.score)
    }
}

fn to_rect(b: &BoundingBox) -> Option<Rect> {
    let x = b.x1.round() as i32;
    let y = b.y1.round() as i32;
    let w = b.width().round() as u32;
    let h = b.height().round() as u32;
    (w > 0 && h > 0).then(|| Rect::at(x, y).of_size(w, h))
}

impl AnnotatorPort for BoxAnnotator {
    fn annotate(&self, image: &RgbImage, detections: &[Detection]) -> RgbImage {
        let mut out = image.clone();
        let lw = Self::line_width(out.width(), out.height());
        let tab_h = lw * 6;
        let scale = PxScale::from(tab_h as f32 * 0.8);

        for det in detections {
            let Some(rect) = to_rect(&det.bbox) else { continue };
            let color = class_color(det.class_id);

            for t in 0..lw as i32 {
                let w = rect.width() as i32 - 2 * t;
                let h = rect.height() as i32 - 2 * t;
                if w <= 0 || h <= 0 {
                    break;
                }
                draw_hollow_rect_mut(
                    &mut out,
                    Rect::at(rect.left() + t, rect.top() + t).of_size(w as u32, h as u32),
                    color,
                );
            }

            // Tab sits above the box, or just inside it when the box touches the top edge.
            let text = self.label_text(det);
            let (text_w, _) = text_size(scale, &self.font, &text);
            let room = (out.width() as i32 - rect.left()).max(1) as u32;
            let tab_w = (text_w + 2 * lw).min(room);
            let tab_y = if rect.top() >= tab_h as i32 { rect.top() - tab_h as i32 } else { rect.top() };
            draw_filled_rect_mut(&mut out, Rect::at(rect.left(), tab_y).of_size(tab_w, tab_h), color);
            draw_text_mut(&mut out, TEXT_COLOR, rect.left() + lw as i32, tab_y + lw as i32 / 2, scale, &self.font, &text);
        }
        out
    }
}
