// Copyright (c) 2026 rezky_nightky

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }

    #[cfg(test)]
    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 1.0)
    }

    pub fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColorStop {
    pub offset: f32,
    pub color: Rgba,
}

impl ColorStop {
    pub const fn new(offset: f32, color: Rgba) -> Self {
        Self { offset, color }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinearGradient<'a> {
    pub from: (f32, f32),
    pub to: (f32, f32),
    pub stops: &'a [ColorStop],
}

/// Radial gradient growing from a focal point (radius 0) to a circle
/// around `center`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RadialGradient<'a> {
    pub focus: (f32, f32),
    pub center: (f32, f32),
    pub radius: f32,
    pub stops: &'a [ColorStop],
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Paint<'a> {
    Solid(Rgba),
    Linear(LinearGradient<'a>),
    Radial(RadialGradient<'a>),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Shape {
    Rect {
        x: f32,
        y: f32,
        w: f32,
        h: f32,
    },
    RoundedRect {
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        radius: f32,
    },
    Circle {
        cx: f32,
        cy: f32,
        r: f32,
    },
    Ellipse {
        cx: f32,
        cy: f32,
        rx: f32,
        ry: f32,
    },
    Line {
        from: (f32, f32),
        to: (f32, f32),
    },
}

// Strokes always use round caps.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StrokeStyle {
    pub width: f32,
}

impl StrokeStyle {
    pub fn round(width: f32) -> Self {
        Self { width }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Shadow {
    pub color: Rgba,
    pub blur: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawState {
    pub alpha: f32,
    pub shadow: Option<Shadow>,
}

impl Default for DrawState {
    fn default() -> Self {
        Self {
            alpha: 1.0,
            shadow: None,
        }
    }
}

pub trait DrawSurface {
    fn width(&self) -> u32;
    fn height(&self) -> u32;

    fn resize(&mut self, width: u32, height: u32);

    fn clear(&mut self);

    fn save(&mut self);
    fn restore(&mut self);
    fn set_alpha(&mut self, alpha: f32);
    fn set_shadow(&mut self, shadow: Option<Shadow>);

    /// Fill the union of `shapes`; overlapping shapes are covered once.
    fn fill(&mut self, shapes: &[Shape], paint: &Paint<'_>);

    fn stroke(&mut self, shapes: &[Shape], paint: &Paint<'_>, style: &StrokeStyle);
}

#[derive(Clone, Debug, Default)]
pub struct StateStack {
    current: DrawState,
    saved: Vec<DrawState>,
}

impl StateStack {
    pub fn current(&self) -> DrawState {
        self.current
    }

    pub fn save(&mut self) {
        self.saved.push(self.current);
    }

    /// Unbalanced restores keep the current state, as a canvas does.
    pub fn restore(&mut self) {
        if let Some(s) = self.saved.pop() {
            self.current = s;
        }
    }

    pub fn set_alpha(&mut self, alpha: f32) {
        if alpha.is_finite() {
            self.current.alpha = alpha.clamp(0.0, 1.0);
        }
    }

    pub fn set_shadow(&mut self, shadow: Option<Shadow>) {
        self.current.shadow = shadow;
    }

    pub fn reset(&mut self) {
        self.current = DrawState::default();
        self.saved.clear();
    }

    #[cfg(test)]
    pub fn depth(&self) -> usize {
        self.saved.len()
    }
}

#[cfg(test)]
pub mod testing {

    use super::*;

    #[derive(Clone, Debug, PartialEq)]
    pub enum Op {
        Clear,
        Fill {
            shapes: Vec<Shape>,
            state: DrawState,
            radial: bool,
        },
        Stroke {
            shapes: Vec<Shape>,
            state: DrawState,
            width: f32,
        },
    }

    #[derive(Debug, Default)]
    pub struct RecordingSurface {
        pub width: u32,
        pub height: u32,
        pub ops: Vec<Op>,
        pub state: StateStack,
    }

    impl RecordingSurface {
        pub fn new(width: u32, height: u32) -> Self {
            Self {
                width,
                height,
                ..Self::default()
            }
        }

        pub fn fills(&self) -> impl Iterator<Item = &Op> {
            self.ops.iter().filter(|op| matches!(op, Op::Fill { .. }))
        }

        pub fn strokes(&self) -> impl Iterator<Item = &Op> {
            self.ops.iter().filter(|op| matches!(op, Op::Stroke { .. }))
        }
    }

    impl DrawSurface for RecordingSurface {
        fn width(&self) -> u32 {
            self.width
        }

        fn height(&self) -> u32 {
            self.height
        }

        fn resize(&mut self, width: u32, height: u32) {
            self.width = width;
            self.height = height;
            self.ops.clear();
        }

        fn clear(&mut self) {
            self.ops.clear();
            self.ops.push(Op::Clear);
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
            self.ops.push(Op::Fill {
                shapes: shapes.to_vec(),
                state: self.state.current(),
                radial: matches!(paint, Paint::Radial(_)),
            });
        }

        fn stroke(&mut self, shapes: &[Shape], _paint: &Paint<'_>, style: &StrokeStyle) {
            self.ops.push(Op::Stroke {
                shapes: shapes.to_vec(),
                state: self.state.current(),
                width: style.width,
            });
        }
    }
}
