use palette::{Hsl, IntoColor, Srgb};
use plotly::color::Rgb;

use crate::config::PaletteKind;
use crate::data::filter::LabelGroup;
use crate::data::model::Value;

/// 8-bit sRGB display color.
pub type Rgb8 = Srgb<u8>;

// ---------------------------------------------------------------------------
// Size-indexed PuBu palette (ColorBrewer, darkest first)
// ---------------------------------------------------------------------------

const PUBU: [&[[u8; 3]]; 7] = [
    &[[0x2b, 0x8c, 0xbe], [0xa6, 0xbd, 0xdb], [0xec, 0xe7, 0xf2]],
    &[[0x05, 0x70, 0xb0], [0x74, 0xa9, 0xcf], [0xbd, 0xc9, 0xe1], [0xf1, 0xee, 0xf6]],
    &[
        [0x04, 0x5a, 0x8d],
        [0x2b, 0x8c, 0xbe],
        [0x74, 0xa9, 0xcf],
        [0xbd, 0xc9, 0xe1],
        [0xf1, 0xee, 0xf6],
    ],
    &[
        [0x04, 0x5a, 0x8d],
        [0x2b, 0x8c, 0xbe],
        [0x74, 0xa9, 0xcf],
        [0xa6, 0xbd, 0xdb],
        [0xd0, 0xd1, 0xe6],
        [0xf1, 0xee, 0xf6],
    ],
    &[
        [0x03, 0x4e, 0x7b],
        [0x05, 0x70, 0xb0],
        [0x36, 0x90, 0xc0],
        [0x74, 0xa9, 0xcf],
        [0xa6, 0xbd, 0xdb],
        [0xd0, 0xd1, 0xe6],
        [0xf1, 0xee, 0xf6],
    ],
    &[
        [0x03, 0x4e, 0x7b],
        [0x05, 0x70, 0xb0],
        [0x36, 0x90, 0xc0],
        [0x74, 0xa9, 0xcf],
        [0xa6, 0xbd, 0xdb],
        [0xd0, 0xd1, 0xe6],
        [0xec, 0xe7, 0xf2],
        [0xff, 0xf7, 0xfb],
    ],
    &[
        [0x02, 0x38, 0x58],
        [0x04, 0x5a, 0x8d],
        [0x05, 0x70, 0xb0],
        [0x36, 0x90, 0xc0],
        [0x74, 0xa9, 0xcf],
        [0xa6, 0xbd, 0xdb],
        [0xd0, 0xd1, 0xe6],
        [0xec, 0xe7, 0xf2],
        [0xff, 0xf7, 0xfb],
    ],
];

/// Smallest and largest PuBu sizes.
pub const PUBU_MIN: usize = 3;
pub const PUBU_MAX: usize = 9;

fn to_colors(raw: &[[u8; 3]]) -> Vec<Rgb8> {
    raw.iter().map(|&[r, g, b]| Rgb8::new(r, g, b)).collect()
}

/// The PuBu palette with exactly `n` colors, if one exists.
pub fn pubu(n: usize) -> Option<Vec<Rgb8>> {
    if !(PUBU_MIN..=PUBU_MAX).contains(&n) {
        return None;
    }
    Some(to_colors(PUBU[n - PUBU_MIN]))
}

/// Colors for `n` labels: the exact-size palette when available, otherwise
/// the largest palette repeated cyclically.
pub fn colors_for(kind: PaletteKind, n: usize) -> Vec<Rgb8> {
    match kind {
        PaletteKind::Hues => generate_palette(n),
        PaletteKind::PuBu => match pubu(n) {
            Some(colors) => colors,
            None => {
                log::debug!("no {n}-color PuBu palette, cycling the {PUBU_MAX}-color one");
                to_colors(PUBU[PUBU_MAX - PUBU_MIN])
                    .into_iter()
                    .cycle()
                    .take(n)
                    .collect()
            }
        },
    }
}

// ---------------------------------------------------------------------------
// Hue palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Rgb8> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.55);
            let rgb: Srgb = hsl.into_color();
            rgb.into_format::<u8>()
        })
        .collect()
}

/// Marker color for a plotly trace.
pub fn to_plotly(c: Rgb8) -> Rgb {
    Rgb::new(c.red, c.green, c.blue)
}

// ---------------------------------------------------------------------------
// Color mapping: label → Rgb8
// ---------------------------------------------------------------------------

/// Assigns one colour per label group, in group order.
#[derive(Debug, Clone)]
pub struct ColorMap {
    entries: Vec<(Option<Value>, Rgb8)>,
}

impl ColorMap {
    /// Build a colour map for the given label groups.
    pub fn new(groups: &[LabelGroup], kind: PaletteKind) -> Self {
        let colors = colors_for(kind, groups.len());
        let entries = groups
            .iter()
            .zip(colors)
            .map(|(g, c)| (g.label.clone(), c))
            .collect();
        ColorMap { entries }
    }

    /// Look up the colour for a label.
    pub fn color_for(&self, label: Option<&Value>) -> Option<Rgb8> {
        self.entries
            .iter()
            .find(|(l, _)| l.as_ref() == label)
            .map(|(_, c)| *c)
    }

    /// Number of distinct colours in use.
    pub fn distinct_colors(&self) -> usize {
        let mut seen: Vec<Rgb8> = Vec::new();
        for (_, c) in &self.entries {
            if !seen.contains(c) {
                seen.push(*c);
            }
        }
        seen.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
