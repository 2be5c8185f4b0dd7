//! A drawing backend wrapper that keeps chart text legible on hosts without usable fonts.

use crate::chart::bitmap_font;
use plotters::style::{FontDesc, FontFamily, FontStyle};
use plotters_backend::text_anchor::{HPos, VPos};
use plotters_backend::{
    BackendColor, BackendCoord, BackendStyle, BackendTextStyle, DrawingBackend, DrawingErrorKind,
};
use std::panic;
use std::sync::OnceLock;

/// Whether plotters can rasterize text in this process. Checked once.
pub fn font_backend_available() -> bool {
    static AVAILABLE: OnceLock<bool> = OnceLock::new();
    *AVAILABLE.get_or_init(|| {
        let font = FontDesc::new(FontFamily::SansSerif, 12.0, FontStyle::Normal);
        let drawn = panic::catch_unwind(panic::AssertUnwindSafe(|| {
            font.draw("0", (0, 0), |_, _, _| Ok::<(), ()>(()))
        }));
        let available = matches!(drawn, Ok(Ok(Ok(()))));
        if !available {
            log::debug!("No font backend available, chart text uses the bitmap font");
        }
        available
    })
}

/// Forwards everything to `inner`. Text goes through the built-in bitmap font when the
/// font backend is unavailable or fails on a particular label.
pub struct FontSafeBackend<DB> {
    inner: DB,
    bitmap_text: bool,
}

impl<DB: DrawingBackend> FontSafeBackend<DB> {
    pub fn new(inner: DB) -> Self {
        Self {
            inner,
            bitmap_text: !font_backend_available(),
        }
    }

    fn draw_bitmap_text<TStyle: BackendTextStyle>(
        &mut self,
        text: &str,
        style: &TStyle,
        pos: BackendCoord,
    ) -> Result<(), DrawingErrorKind<DB::ErrorType>> {
        let color: BackendColor = style.color();
        if color.alpha == 0.0 {
            return Ok(());
        }
        let (width, height) = bitmap_font::text_box(text, style.size());
        let (width, height) = (width as i32, height as i32);
        let anchor = style.anchor();
        let dx = match anchor.h_pos {
            HPos::Left => 0,
            HPos::Center => -width / 2,
            HPos::Right => -width,
        };
        let dy = match anchor.v_pos {
            VPos::Top => 0,
            VPos::Center => -height / 2,
            VPos::Bottom => -height,
        };

        let transform = style.transform();
        let mut pixels = Vec::new();
        bitmap_font::rasterize(text, style.size(), |x, y| {
            pixels.push(transform.transform(x + dx, y + dy));
        });
        for (x, y) in pixels {
            self.inner.draw_pixel((pos.0 + x, pos.1 + y), color)?;
        }
        Ok(())
    }
}

impl<DB: DrawingBackend> DrawingBackend for FontSafeBackend<DB> {
    type ErrorType = DB::ErrorType;

    fn get_size(&self) -> (u32, u32) {
        self.inner.get_size()
    }

    fn ensure_prepared(&mut self) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.ensure_prepared()
    }

    fn present(&mut self) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.present()
    }

    fn draw_pixel(
        &mut self,
        point: BackendCoord,
        color: BackendColor,
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.draw_pixel(point, color)
    }

    fn draw_line<S: BackendStyle>(
        &mut self,
        from: BackendCoord,
        to: BackendCoord,
        style: &S,
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.draw_line(from, to, style)
    }

    fn draw_rect<S: BackendStyle>(
        &mut self,
        upper_left: BackendCoord,
        bottom_right: BackendCoord,
        style: &S,
        fill: bool,
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.draw_rect(upper_left, bottom_right, style, fill)
    }

    fn draw_path<S: BackendStyle, I: IntoIterator<Item = BackendCoord>>(
        &mut self,
        path: I,
        style: &S,
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.draw_path(path, style)
    }

    fn draw_circle<S: BackendStyle>(
        &mut self,
        center: BackendCoord,
        radius: u32,
        style: &S,
        fill: bool,
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.draw_circle(center, radius, style, fill)
    }

    fn blit_bitmap(
        &mut self,
        pos: BackendCoord,
        (iw, ih): (u32, u32),
        src: &[u8],
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.blit_bitmap(pos, (iw, ih), src)
    }

    fn draw_text<TStyle: BackendTextStyle>(
        &mut self,
        text: &str,
        style: &TStyle,
        pos: BackendCoord,
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        if !self.bitmap_text {
            let drawn = panic::catch_unwind(panic::AssertUnwindSafe(|| {
                self.inner.draw_text(text, style, pos)
            }));
            match drawn {
                Ok(Err(DrawingErrorKind::FontError(e))) => {
                    log::trace!("Font backend failed on {:?}: {}", text, e);
                }
                Ok(result) => return result,
                Err(_) => log::trace!("Font backend panicked on {:?}", text),
            }
        }
        self.draw_bitmap_text(text, style, pos)
    }

    fn estimate_text_size<TStyle: BackendTextStyle>(
        &self,
        text: &str,
        style: &TStyle,
    ) -> Result<(u32, u32), DrawingErrorKind<Self::ErrorType>> {
        let bitmap_box = || {
            let (w, h) = bitmap_font::text_box(text, style.size());
            let (w, h) = style.transform().transform(w as i32, h as i32);
            (w.unsigned_abs(), h.unsigned_abs())
        };
        if self.bitmap_text {
            return Ok(bitmap_box());
        }
        let estimated = panic::catch_unwind(panic::AssertUnwindSafe(|| {
            self.inner.estimate_text_size(text, style)
        }));
        match estimated {
            Ok(Ok(size)) => Ok(size),
            Ok(Err(DrawingErrorKind::FontError(_))) | Err(_) => Ok(bitmap_box()),
            Ok(Err(e)) => Err(e),
        }
    }
}
