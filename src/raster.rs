// Copyright (c) 2026 rezky_nightky

use tiny_skia::{
    BlendMode, Color, FillRule, FilterQuality, GradientStop, LineCap, LinearGradient as SkLinear,
    Paint as SkPaint, Path, PathBuilder, Pattern, Pixmap, Point, RadialGradient as SkRadial, Rect,
    Shader, SpreadMode, Stroke, Transform,
};

use crate::surface::{
    ColorStop, DrawSurface, Paint, Rgba, Shadow, Shape, StateStack, StrokeStyle,
};

// Smallest circle radius and stroke width, in raster pixels.
const MIN_RADIUS_PX: f32 = 0.5;
const MIN_STROKE_PX: f32 = 1.0;

// Cubic control distance for quarter-circle corners.
const KAPPA: f32 = 0.552_284_8;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Bounds {
    x: i32,
    y: i32,
    w: u32,
    h: u32,
}

pub struct PixmapSurface {
    width: u32,
    height: u32,
    scale: f32,
    pixmap: Pixmap,
    // Same size as `pixmap`; transparent between fills.
    scratch: Pixmap,
    paths: Vec<Path>,
    line: Vec<u8>,
    state: StateStack,
}

impl PixmapSurface {
    // `scale` is raster pixels per viewport pixel.
    pub fn new(width: u32, height: u32, scale: f32) -> Option<Self> {
        if !(scale.is_finite() && scale > 0.0) {
            return None;
        }
        let (rw, rh) = raster_size(width, height, scale);
        Some(Self {
            width,
            height,
            scale,
            pixmap: Pixmap::new(rw, rh)?,
            scratch: Pixmap::new(rw, rh)?,
            paths: Vec::new(),
            line: Vec::new(),
            state: StateStack::default(),
        })
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    fn transform(&self) -> Transform {
        Transform::from_scale(self.scale, self.scale)
    }

    fn build_path(&self, shape: &Shape) -> Option<Path> {
        let min_r = MIN_RADIUS_PX / self.scale;
        let mut pb = PathBuilder::new();
        match *shape {
            Shape::Rect { x, y, w, h } => {
                pb.push_rect(Rect::from_xywh(x, y, w, h)?);
            }
            Shape::RoundedRect { x, y, w, h, radius } => {
                push_rounded_rect(&mut pb, x, y, w, h, radius);
            }
            Shape::Circle { cx, cy, r } => {
                pb.push_circle(cx, cy, r.max(min_r));
            }
            Shape::Ellipse { cx, cy, rx, ry } => {
                let (rx, ry) = (rx.max(min_r), ry.max(min_r));
                pb.push_oval(Rect::from_xywh(cx - rx, cy - ry, rx * 2.0, ry * 2.0)?);
            }
            Shape::Line { from, to } => {
                pb.move_to(from.0, from.1);
                pb.line_to(to.0, to.1);
            }
        }
        pb.finish()
    }

    fn raster_bounds(&self, shapes: &[Shape], margin: f32) -> Option<Bounds> {
        let min_r = MIN_RADIUS_PX / self.scale;
        let (mut x0, mut y0) = (f32::INFINITY, f32::INFINITY);
        let (mut x1, mut y1) = (f32::NEG_INFINITY, f32::NEG_INFINITY);
        for s in shapes {
            let (ax, ay, bx, by) = match *s {
                Shape::Rect { x, y, w, h } | Shape::RoundedRect { x, y, w, h, .. } => {
                    (x, y, x + w, y + h)
                }
                Shape::Circle { cx, cy, r } => {
                    let r = r.max(min_r);
                    (cx - r, cy - r, cx + r, cy + r)
                }
                Shape::Ellipse { cx, cy, rx, ry } => {
                    let (rx, ry) = (rx.max(min_r), ry.max(min_r));
                    (cx - rx, cy - ry, cx + rx, cy + ry)
                }
                Shape::Line { from, to } => (
                    from.0.min(to.0),
                    from.1.min(to.1),
                    from.0.max(to.0),
                    from.1.max(to.1),
                ),
            };
            x0 = x0.min(ax);
            y0 = y0.min(ay);
            x1 = x1.max(bx);
            y1 = y1.max(by);
        }
        if !(x0.is_finite() && y0.is_finite() && x1.is_finite() && y1.is_finite()) {
            return None;
        }

        let rx0 = (((x0 - margin) * self.scale).floor() as i32 - 1).max(0);
        let ry0 = (((y0 - margin) * self.scale).floor() as i32 - 1).max(0);
        let rx1 = (((x1 + margin) * self.scale).ceil() as i32 + 1).min(self.pixmap.width() as i32);
        let ry1 = (((y1 + margin) * self.scale).ceil() as i32 + 1).min(self.pixmap.height() as i32);
        if rx1 <= rx0 || ry1 <= ry0 {
            return None;
        }
        Some(Bounds {
            x: rx0,
            y: ry0,
            w: (rx1 - rx0) as u32,
            h: (ry1 - ry0) as u32,
        })
    }

    // Source blending, so overlapping shapes do not accumulate opacity.
    fn paint_scratch(&mut self, paths: &[Path], shader: Shader<'_>) {
        let paint = SkPaint {
            shader,
            anti_alias: true,
            blend_mode: BlendMode::Source,
            ..SkPaint::default()
        };
        let xf = self.transform();
        for path in paths {
            self.scratch.fill_path(path, &paint, FillRule::Winding, xf, None);
        }
    }

    fn flush_scratch(&mut self, bounds: Bounds, opacity: f32) {
        let Some(rect) = Rect::from_xywh(
            bounds.x as f32,
            bounds.y as f32,
            bounds.w as f32,
            bounds.h as f32,
        ) else {
            return;
        };
        {
            let paint = SkPaint {
                shader: Pattern::new(
                    self.scratch.as_ref(),
                    SpreadMode::Pad,
                    FilterQuality::Nearest,
                    opacity.clamp(0.0, 1.0),
                    Transform::identity(),
                ),
                ..SkPaint::default()
            };
            self.pixmap.fill_rect(rect, &paint, Transform::identity(), None);
        }
        let clear = SkPaint {
            blend_mode: BlendMode::Clear,
            ..SkPaint::default()
        };
        self.scratch.fill_rect(rect, &clear, Transform::identity(), None);
    }
}

impl DrawSurface for PixmapSurface {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn resize(&mut self, width: u32, height: u32) {
        let (rw, rh) = raster_size(width, height, self.scale);
        match Pixmap::new(rw, rh).zip(Pixmap::new(rw, rh)) {
            Some((p, scratch)) => {
                self.pixmap = p;
                self.scratch = scratch;
                self.width = width;
                self.height = height;
            }
            None => {
                tracing::warn!(width, height, "raster surface resize rejected; keeping old size");
            }
        }
        self.state.reset();
    }

    fn clear(&mut self) {
        self.pixmap.fill(Color::TRANSPARENT);
    }

    fn save(&mut self) {
        self.state.save();
    }

    fn restore(&mut self) {
        self.state.restore();
    }

    fn set_alpha(&mut self, alpha: f32) {
        self.state.set_alpha(alpha);
    }

    fn set_shadow(&mut self, shadow: Option<Shadow>) {
        self.state.set_shadow(shadow);
    }

    fn fill(&mut self, shapes: &[Shape], paint: &Paint<'_>) {
        let st = self.state.current();
        if st.alpha <= 0.0 || shapes.is_empty() {
            return;
        }
        let blur = st.shadow.map(|s| s.blur.max(0.0)).unwrap_or(0.0);
        let Some(bounds) = self.raster_bounds(shapes, blur) else {
            return;
        };
        let mut paths = std::mem::take(&mut self.paths);
        paths.clear();
        paths.extend(shapes.iter().filter_map(|s| self.build_path(s)));
        if !paths.is_empty() {
            if let Some(shadow) = st.shadow {
                let solid = Shader::SolidColor(to_color(shadow.color.with_alpha(1.0), 1.0));
                self.paint_scratch(&paths, solid);
                let radius = (shadow.blur * self.scale * 0.5).round().max(1.0) as usize;
                box_blur(&mut self.scratch, bounds, radius, &mut self.line);
                box_blur(&mut self.scratch, bounds, radius, &mut self.line);
                self.flush_scratch(bounds, st.alpha * shadow.color.a);
            }
            self.paint_scratch(&paths, to_shader(paint, 1.0));
            self.flush_scratch(bounds, st.alpha);
        }
        self.paths = paths;
    }

    fn stroke(&mut self, shapes: &[Shape], paint: &Paint<'_>, style: &StrokeStyle) {
        let st = self.state.current();
        if st.alpha <= 0.0 {
            return;
        }
        let sk_paint = SkPaint {
            shader: to_shader(paint, st.alpha),
            anti_alias: true,
            ..SkPaint::default()
        };
        let stroke = Stroke {
            width: style.width.max(MIN_STROKE_PX / self.scale),
            line_cap: LineCap::Round,
            ..Stroke::default()
        };
        let xf = self.transform();
        for shape in shapes {
            if let Some(path) = self.build_path(shape) {
                self.pixmap.stroke_path(&path, &sk_paint, &stroke, xf, None);
            }
        }
    }
}

fn raster_size(width: u32, height: u32, scale: f32) -> (u32, u32) {
    let rw = (width as f32 * scale).ceil().max(1.0) as u32;
    let rh = (height as f32 * scale).ceil().max(1.0) as u32;
    (rw, rh)
}

fn to_color(c: Rgba, alpha: f32) -> Color {
    let a = (c.a * alpha).clamp(0.0, 1.0);
    Color::from_rgba8(c.r, c.g, c.b, (a * 255.0).round() as u8)
}

fn to_stops(stops: &[ColorStop], alpha: f32) -> Vec<GradientStop> {
    stops
        .iter()
        .map(|s| GradientStop::new(s.offset, to_color(s.color, alpha)))
        .collect()
}

fn first_color(stops: &[ColorStop], alpha: f32) -> Color {
    stops
        .first()
        .map(|s| to_color(s.color, alpha))
        .unwrap_or(Color::TRANSPARENT)
}

/// Gradients that tiny-skia rejects (zero length or radius) degrade to their
/// first stop.
fn to_shader(paint: &Paint<'_>, alpha: f32) -> Shader<'static> {
    match paint {
        Paint::Solid(c) => Shader::SolidColor(to_color(*c, alpha)),
        Paint::Linear(g) => SkLinear::new(
            Point::from_xy(g.from.0, g.from.1),
            Point::from_xy(g.to.0, g.to.1),
            to_stops(g.stops, alpha),
            SpreadMode::Pad,
            Transform::identity(),
        )
        .unwrap_or_else(|| Shader::SolidColor(first_color(g.stops, alpha))),
        Paint::Radial(g) => SkRadial::new(
            Point::from_xy(g.focus.0, g.focus.1),
            Point::from_xy(g.center.0, g.center.1),
            g.radius,
            to_stops(g.stops, alpha),
            SpreadMode::Pad,
            Transform::identity(),
        )
        .unwrap_or_else(|| Shader::SolidColor(first_color(g.stops, alpha))),
    }
}

fn push_rounded_rect(pb: &mut PathBuilder, x: f32, y: f32, w: f32, h: f32, radius: f32) {
    let r = radius.clamp(0.0, w.min(h) * 0.5);
    let k = r * KAPPA;
    let (x1, y1) = (x + w, y + h);
    pb.move_to(x + r, y);
    pb.line_to(x1 - r, y);
    pb.cubic_to(x1 - r + k, y, x1, y + r - k, x1, y + r);
    pb.line_to(x1, y1 - r);
    pb.cubic_to(x1, y1 - r + k, x1 - r + k, y1, x1 - r, y1);
    pb.line_to(x + r, y1);
    pb.cubic_to(x + r - k, y1, x, y1 - r + k, x, y1 - r);
    pb.line_to(x, y + r);
    pb.cubic_to(x, y + r - k, x + r - k, y, x + r, y);
    pb.close();
}

// Blur only the `b` region of `layer`; pixels outside it count as transparent.
fn box_blur(layer: &mut Pixmap, b: Bounds, radius: usize, line: &mut Vec<u8>) {
    let stride = layer.width() as usize;
    let (x0, y0) = (b.x.max(0) as usize, b.y.max(0) as usize);
    let (w, h) = (b.w as usize, b.h as usize);
    if radius == 0 || w == 0 || h == 0 {
        return;
    }
    let data = layer.data_mut();

    for y in y0..y0 + h {
        let row = (y * stride + x0) * 4;
        line.clear();
        line.extend_from_slice(&data[row..row + w * 4]);
        blur_line(line, w, 4, radius, |i, px| {
            data[row + i * 4..row + i * 4 + 4].copy_from_slice(&px);
        });
    }

    for x in x0..x0 + w {
        line.clear();
        for y in y0..y0 + h {
            let o = (y * stride + x) * 4;
            line.extend_from_slice(&data[o..o + 4]);
        }
        blur_line(line, h, 4, radius, |i, px| {
            let o = ((y0 + i) * stride + x) * 4;
            data[o..o + 4].copy_from_slice(&px);
        });
    }
}

fn blur_line(
    src: &[u8],
    len: usize,
    stride: usize,
    radius: usize,
    mut out: impl FnMut(usize, [u8; 4]),
) {
    let window = (radius * 2 + 1) as u32;
    let mut sum = [0u32; 4];
    // Pixels outside the line count as transparent.
    for i in 0..=radius.min(len.saturating_sub(1)) {
        for c in 0..4 {
            sum[c] += src[i * stride + c] as u32;
        }
    }
    for i in 0..len {
        let mut px = [0u8; 4];
        for c in 0..4 {
            px[c] = (sum[c] / window) as u8;
        }
        out(i, px);

        let add = i + radius + 1;
        if add < len {
            for c in 0..4 {
                sum[c] += src[add * stride + c] as u32;
            }
        }
        if i >= radius {
            let sub = i - radius;
            for c in 0..4 {
                sum[c] -= src[sub * stride + c] as u32;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::LinearGradient;

    fn alpha_at(s: &PixmapSurface, x: u32, y: u32) -> u8 {
        s.pixmap().pixel(x, y).map(|p| p.alpha()).unwrap_or(0)
    }

    #[test]
    fn raster_is_downsampled_from_viewport() {
        let s = PixmapSurface::new(640, 320, 0.125).unwrap();
        assert_eq!((s.width(), s.height()), (640, 320));
        assert_eq!((s.pixmap().width(), s.pixmap().height()), (80, 40));
    }

    #[test]
    fn invalid_scale_yields_no_surface() {
        assert!(PixmapSurface::new(100, 100, 0.0).is_none());
        assert!(PixmapSurface::new(100, 100, f32::NAN).is_none());
    }

    #[test]
    fn filled_circle_covers_its_centre() {
        let mut s = PixmapSurface::new(160, 160, 0.25).unwrap();
        s.fill(
            &[Shape::Circle {
                cx: 80.0,
                cy: 80.0,
                r: 40.0,
            }],
            &Paint::Solid(Rgba::opaque(255, 255, 255)),
        );
        assert_eq!(alpha_at(&s, 20, 20), 255);
        assert_eq!(alpha_at(&s, 1, 1), 0);
    }

    #[test]
    fn overlapping_union_is_not_double_counted() {
        let mut s = PixmapSurface::new(100, 100, 1.0).unwrap();
        s.set_alpha(0.5);
        const STOPS: [ColorStop; 2] = [
            ColorStop::new(0.0, Rgba::new(255, 255, 255, 1.0)),
            ColorStop::new(1.0, Rgba::new(255, 255, 255, 1.0)),
        ];
        let shapes = [
            Shape::Circle {
                cx: 45.0,
                cy: 50.0,
                r: 20.0,
            },
            Shape::Circle {
                cx: 55.0,
                cy: 50.0,
                r: 20.0,
            },
        ];
        s.fill(
            &shapes,
            &Paint::Linear(LinearGradient {
                from: (0.0, 0.0),
                to: (100.0, 100.0),
                stops: &STOPS,
            }),
        );
        let overlap = alpha_at(&s, 50, 50) as i32;
        let single = alpha_at(&s, 30, 50) as i32;
        assert!((overlap - single).abs() <= 2, "{} vs {}", overlap, single);
        assert!((overlap - 128).abs() <= 3);
    }

    #[test]
    fn shadow_spreads_beyond_the_shape() {
        let mut s = PixmapSurface::new(100, 100, 1.0).unwrap();
        s.set_shadow(Some(Shadow {
            color: Rgba::opaque(255, 255, 255),
            blur: 12.0,
        }));
        s.fill(
            &[Shape::Rect {
                x: 40.0,
                y: 40.0,
                w: 20.0,
                h: 20.0,
            }],
            &Paint::Solid(Rgba::opaque(255, 255, 255)),
        );
        assert!(alpha_at(&s, 62, 50) > 0);
        assert_eq!(alpha_at(&s, 5, 5), 0);
    }

    #[test]
    fn scratch_layer_is_left_clean_between_fills() {
        let mut s = PixmapSurface::new(100, 100, 1.0).unwrap();
        s.set_shadow(Some(Shadow {
            color: Rgba::opaque(255, 255, 255),
            blur: 8.0,
        }));
        s.fill(
            &[Shape::Circle {
                cx: 20.0,
                cy: 20.0,
                r: 10.0,
            }],
            &Paint::Solid(Rgba::opaque(255, 255, 255)),
        );
        assert!(s.scratch.pixels().iter().all(|p| p.alpha() == 0));

        s.clear();
        s.set_shadow(None);
        s.fill(
            &[Shape::Circle {
                cx: 80.0,
                cy: 80.0,
                r: 10.0,
            }],
            &Paint::Solid(Rgba::opaque(255, 255, 255)),
        );
        assert_eq!(alpha_at(&s, 20, 20), 0);
        assert_eq!(alpha_at(&s, 80, 80), 255);
        assert!(s.paths.capacity() >= 1);
    }

    #[test]
    fn hairline_strokes_stay_visible_when_downsampled() {
        let mut s = PixmapSurface::new(800, 400, 0.125).unwrap();
        s.stroke(
            &[Shape::Line {
                from: (400.0, 100.0),
                to: (400.0, 300.0),
            }],
            &Paint::Solid(Rgba::opaque(170, 210, 255)),
            &StrokeStyle::round(1.0),
        );
        let hit = (12..38).any(|y| alpha_at(&s, 50, y) > 0 || alpha_at(&s, 49, y) > 0);
        assert!(hit);
    }

    #[test]
    fn clear_resets_pixels_and_resize_reallocates() {
        let mut s = PixmapSurface::new(40, 40, 1.0).unwrap();
        s.fill(
            &[Shape::Rect {
                x: 0.0,
                y: 0.0,
                w: 40.0,
                h: 40.0,
            }],
            &Paint::Solid(Rgba::opaque(10, 20, 30)),
        );
        assert_eq!(alpha_at(&s, 10, 10), 255);
        s.clear();
        assert_eq!(alpha_at(&s, 10, 10), 0);
        s.resize(80, 20);
        assert_eq!((s.pixmap().width(), s.pixmap().height()), (80, 20));
    }
}
