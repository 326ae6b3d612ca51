//! Composed page rendering
//!
//! A composed page is a fresh page whose content stream only draws Form
//! XObjects at computed positions.

use super::xobject::{PageForm, is_quarter_turn};
use crate::types::*;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};

/// Builder for one composed output page
#[derive(Debug)]
pub struct PageBuilder {
    dimensions: PageDimensions,
    content_ops: Vec<String>,
    xobjects: Dictionary,
}

impl PageBuilder {
    /// Start an empty page of the given size
    pub fn new(dimensions: PageDimensions) -> Self {
        Self {
            dimensions,
            content_ops: Vec::new(),
            xobjects: Dictionary::new(),
        }
    }

    /// Draw `form` stretched onto `dest` (top-left page coordinates).
    ///
    /// `dest` is in displayed orientation; a rotated source page is turned
    /// so it appears upright.
    pub fn draw_form(&mut self, form: &PageForm, dest: &Rectangle) -> Result<()> {
        let [bx0, by0, bx1, by1] = form.bbox;
        let (bbox_width, bbox_height) = (bx1 - bx0, by1 - by0);
        if bbox_width <= 0.0 || bbox_height <= 0.0 {
            return Err(MergeError::Geometry(format!(
                "Source page has degenerate size {}x{}",
                bbox_width, bbox_height
            )));
        }

        let name = format!("P{}", self.xobjects.len());
        self.xobjects
            .set(name.as_bytes(), Object::Reference(form.id));
        self.content_ops.push(generate_placement_command(
            &name,
            dest,
            self.dimensions.height_pt,
            form.bbox,
            form.rotation,
        ));
        Ok(())
    }

    /// Add the page object to `output` under `parent` and return its id
    pub(crate) fn finish(self, output: &mut Document, parent: ObjectId) -> ObjectId {
        let mut page_dict = Dictionary::new();
        page_dict.set("Type", Object::Name(b"Page".to_vec()));
        page_dict.set("Parent", Object::Reference(parent));
        page_dict.set(
            "MediaBox",
            Object::Array(vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(self.dimensions.width_pt),
                Object::Real(self.dimensions.height_pt),
            ]),
        );

        let mut resources = Dictionary::new();
        resources.set("XObject", Object::Dictionary(self.xobjects));

        let content = self.content_ops.join("");
        let content_id = output.add_object(Stream::new(Dictionary::new(), content.into_bytes()));

        page_dict.set("Contents", Object::Reference(content_id));
        page_dict.set("Resources", Object::Dictionary(resources));

        output.add_object(page_dict)
    }
}

/// Generate the content stream command that maps a form's bounding box onto
/// `dest`. The destination is flipped into PDF user space (origin bottom-left)
/// and the page's display rotation is folded into the matrix.
fn generate_placement_command(
    xobject_name: &str,
    dest: &Rectangle,
    page_height: f32,
    [bx0, by0, bx1, by1]: [f32; 4],
    rotation: u16,
) -> String {
    let (shown_width, shown_height) = if is_quarter_turn(rotation) {
        (by1 - by0, bx1 - bx0)
    } else {
        (bx1 - bx0, by1 - by0)
    };
    let sx = dest.width() / shown_width;
    let sy = dest.height() / shown_height;
    let x = dest.x0;
    let y = page_height - dest.y1;

    let [a, b, c, d, e, f] = match rotation {
        90 => [0.0, -sy, sx, 0.0, x - sx * by0, y + sy * bx1],
        180 => [-sx, 0.0, 0.0, -sy, x + sx * bx1, y + sy * by1],
        270 => [0.0, sy, -sx, 0.0, x + sx * by1, y - sy * bx0],
        _ => [sx, 0.0, 0.0, sy, x - sx * bx0, y - sy * by0],
    };
    format!(
        "q {} {} {} {} {} {} cm /{} Do Q\n",
        a, b, c, d, e, f, xobject_name
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placement_flips_y_axis() {
        let dest = Rectangle::new(50.0, 100.0, 150.0, 300.0);
        let cmd = generate_placement_command("P0", &dest, 800.0, [0.0, 0.0, 100.0, 200.0], 0);
        assert_eq!(cmd, "q 1 0 0 1 50 500 cm /P0 Do Q\n");
    }

    #[test]
    fn test_placement_compensates_bbox_origin() {
        let dest = Rectangle::new(0.0, 0.0, 50.0, 50.0);
        let cmd = generate_placement_command("P1", &dest, 50.0, [10.0, 20.0, 110.0, 120.0], 0);
        assert_eq!(cmd, "q 0.5 0 0 0.5 -5 -10 cm /P1 Do Q\n");
    }

    #[test]
    fn test_placement_turns_rotated_pages() {
        // Portrait page shown landscape: its bottom-left corner lands top-left
        let dest = Rectangle::new(0.0, 0.0, 792.0, 612.0);
        let bbox = [0.0, 0.0, 612.0, 792.0];

        let cmd = generate_placement_command("P0", &dest, 612.0, bbox, 90);
        assert_eq!(cmd, "q 0 -1 1 0 0 612 cm /P0 Do Q\n");

        let cmd = generate_placement_command("P0", &dest, 612.0, bbox, 270);
        assert_eq!(cmd, "q 0 1 -1 0 792 0 cm /P0 Do Q\n");

        let dest = Rectangle::new(0.0, 0.0, 612.0, 792.0);
        let cmd = generate_placement_command("P0", &dest, 792.0, bbox, 180);
        assert_eq!(cmd, "q -1 0 0 -1 612 792 cm /P0 Do Q\n");
    }

    #[test]
    fn test_degenerate_form_rejected() {
        let mut page = PageBuilder::new(PageDimensions::new(100.0, 100.0));
        let form = PageForm {
            id: (1, 0),
            bbox: [0.0, 0.0, 0.0, 100.0],
            rotation: 0,
        };
        let result = page.draw_form(&form, &Rectangle::new(0.0, 0.0, 10.0, 10.0));
        assert!(matches!(result, Err(MergeError::Geometry(_))));
    }
}
