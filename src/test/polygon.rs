use geo::{polygon, Polygon};

use crate::array::WKBArray;
use crate::test::wkb::wkb_array;

/// A 10 by 10 degree square on the equator.
pub(crate) fn p0() -> Polygon {
    polygon![
        (x: 0., y: 0.),
        (x: 10., y: 0.),
        (x: 10., y: 10.),
        (x: 0., y: 10.),
        (x: 0., y: 0.),
    ]
}

/// A square with a square hole.
pub(crate) fn p1() -> Polygon {
    polygon!(
        exterior: [
            (x: -10., y: -10.),
            (x: 10., y: -10.),
            (x: 10., y: 10.),
            (x: -10., y: 10.),
            (x: -10., y: -10.),
        ],
        interiors: [
            [
                (x: -5., y: -5.),
                (x: -5., y: 5.),
                (x: 5., y: 5.),
                (x: 5., y: -5.),
                (x: -5., y: -5.),
            ],
        ],
    )
}

pub(crate) fn polygon_array() -> WKBArray<i32> {
    wkb_array(vec![Some(p0().into()), Some(p1().into())])
}
