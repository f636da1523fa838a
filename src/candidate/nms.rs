//! Suppression of results nested inside larger ones.

use crate::geometry::BoundingBox;

/// Slack in pixels when testing whether one box lies inside another.
const NEST_MARGIN: f64 = 4.0;

/// Area ratio above which two nested boxes are treated as the same shape.
const SAME_SHAPE_RATIO: f64 = 0.9;

/// Drops items whose bounding box lies inside a larger kept item's box.
///
/// Items are visited by descending box area. A nested item is dropped; when
/// the two areas are within [`SAME_SHAPE_RATIO`] (typically the outer and
/// inner border of one stroke) the one with the lower rate is dropped
/// instead. Survivors keep their input order.
pub(crate) fn suppress_nested<T>(
    items: Vec<T>,
    bbox: impl Fn(&T) -> BoundingBox,
    rate: impl Fn(&T) -> f64,
) -> Vec<T> {
    let mut order: Vec<usize> = (0..items.len()).collect();
    order.sort_by(|&a, &b| {
        bbox(&items[b])
            .area()
            .total_cmp(&bbox(&items[a]).area())
            .then_with(|| a.cmp(&b))
    });

    let mut kept: Vec<usize> = Vec::new();
    'outer: for idx in order {
        let inner = bbox(&items[idx]);
        for slot in kept.iter_mut() {
            let outer = bbox(&items[*slot]);
            if !outer.inflate(NEST_MARGIN).contains(&inner) {
                continue;
            }
            let outer_area = outer.area();
            if outer_area > 0.0
                && inner.area() / outer_area > SAME_SHAPE_RATIO
                && rate(&items[idx]) > rate(&items[*slot])
            {
                *slot = idx;
            }
            continue 'outer;
        }
        kept.push(idx);
    }

    let mut keep = vec![false; items.len()];
    for idx in kept {
        keep[idx] = true;
    }
    items
        .into_iter()
        .zip(keep)
        .filter_map(|(item, keep)| keep.then_some(item))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::suppress_nested;
    use crate::geometry::BoundingBox;

    fn boxed(min: f64, max: f64, rate: f64) -> (BoundingBox, f64) {
        (
            BoundingBox {
                min_x: min,
                min_y: min,
                max_x: max,
                max_y: max,
            },
            rate,
        )
    }

    fn run(items: Vec<(BoundingBox, f64)>) -> Vec<(BoundingBox, f64)> {
        suppress_nested(items, |item| item.0, |item| item.1)
    }

    #[test]
    fn drops_small_box_inside_large_one() {
        let kept = run(vec![boxed(20.0, 30.0, 0.99), boxed(0.0, 100.0, 0.9)]);
        assert_eq!(kept, vec![boxed(0.0, 100.0, 0.9)]);
    }

    #[test]
    fn same_sized_boxes_keep_higher_rate() {
        let kept = run(vec![boxed(0.0, 100.0, 0.9), boxed(2.0, 98.0, 0.95)]);
        assert_eq!(kept, vec![boxed(2.0, 98.0, 0.95)]);
    }

    #[test]
    fn disjoint_boxes_survive_in_input_order() {
        let items = vec![
            boxed(0.0, 10.0, 0.9),
            boxed(50.0, 100.0, 0.9),
            boxed(20.0, 30.0, 0.9),
        ];
        assert_eq!(run(items.clone()), items);
    }
}
