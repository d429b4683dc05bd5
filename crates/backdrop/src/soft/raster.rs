use super::stage::ClipVertex;

/// A vertex after perspective divide and viewport transform.
///
/// Window coordinates put pixel row 0 at the top, matching wgpu's
/// framebuffer convention.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct ScreenVertex {
    pub x: f32,
    pub y: f32,
    pub tex_coord: [f32; 2],
}

pub(crate) fn to_screen(clip: &ClipVertex, width: u32, height: u32) -> ScreenVertex {
    let w = clip.position[3];
    let ndc_x = clip.position[0] / w;
    let ndc_y = clip.position[1] / w;
    ScreenVertex {
        x: (ndc_x + 1.0) * 0.5 * width as f32,
        y: (1.0 - ndc_y) * 0.5 * height as f32,
        tex_coord: clip.tex_coord,
    }
}

/// Vertex index triples of a triangle strip with `count` vertices.
///
/// Odd triangles swap their first two indices so every triangle keeps the
/// strip's winding.
pub(crate) fn strip_triangles(count: usize) -> impl Iterator<Item = [usize; 3]> {
    (0..count.saturating_sub(2)).map(|i| {
        if i % 2 == 0 {
            [i, i + 1, i + 2]
        } else {
            [i + 1, i, i + 2]
        }
    })
}

fn edge(a: &ScreenVertex, b: &ScreenVertex, px: f32, py: f32) -> f32 {
    (b.x - a.x) * (py - a.y) - (b.y - a.y) * (px - a.x)
}

/// Top or left edge of a triangle with positive area under [`edge`], with
/// y pointing down.
fn is_top_left(a: &ScreenVertex, b: &ScreenVertex) -> bool {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    dy < 0.0 || (dy == 0.0 && dx > 0.0)
}

fn inside(weight: f32, top_left: bool) -> bool {
    weight > 0.0 || (weight == 0.0 && top_left)
}

/// Calls `shade(x, y, tex_coord)` for every pixel whose centre lies inside
/// the triangle. Degenerate triangles cover nothing.
///
/// Centres exactly on an edge follow the top-left fill rule, so triangles
/// sharing an edge never both cover a pixel and a quad edge landing on a
/// pixel centre covers the same pixels a hardware rasterizer would.
pub(crate) fn rasterize<F>(triangle: [&ScreenVertex; 3], width: u32, height: u32, mut shade: F)
where
    F: FnMut(u32, u32, [f32; 2]),
{
    let [a, mut b, mut c] = triangle;
    let mut area = edge(a, b, c.x, c.y);
    if area == 0.0 || !area.is_finite() {
        return;
    }
    if area < 0.0 {
        std::mem::swap(&mut b, &mut c);
        area = -area;
    }

    let min_x = a.x.min(b.x).min(c.x).floor().max(0.0) as u32;
    let min_y = a.y.min(b.y).min(c.y).floor().max(0.0) as u32;
    let max_x = (a.x.max(b.x).max(c.x).ceil().max(0.0) as u32).min(width);
    let max_y = (a.y.max(b.y).max(c.y).ceil().max(0.0) as u32).min(height);
    let (top_left_a, top_left_b, top_left_c) =
        (is_top_left(b, c), is_top_left(c, a), is_top_left(a, b));

    for y in min_y..max_y {
        let py = y as f32 + 0.5;
        for x in min_x..max_x {
            let px = x as f32 + 0.5;
            let w_a = edge(b, c, px, py);
            let w_b = edge(c, a, px, py);
            let w_c = edge(a, b, px, py);
            if !(inside(w_a, top_left_a) && inside(w_b, top_left_b) && inside(w_c, top_left_c)) {
                continue;
            }

            let (l_a, l_b, l_c) = (w_a / area, w_b / area, w_c / area);
            let tex_coord = [
                l_a * a.tex_coord[0] + l_b * b.tex_coord[0] + l_c * c.tex_coord[0],
                l_a * a.tex_coord[1] + l_b * b.tex_coord[1] + l_c * c.tex_coord[1],
            ];
            shade(x, y, tex_coord);
        }
    }
}
