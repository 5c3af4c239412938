use nalgebra::{distance, Point2};

const CONTAINS_EPSILON: f64 = 1e-7;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circle {
    pub center: Point2<f64>,
    pub radius: f64,
}

impl Circle {
    fn contains(&self, point: &Point2<f64>) -> bool {
        distance(&self.center, point) <= self.radius * (1. + CONTAINS_EPSILON) + CONTAINS_EPSILON
    }

    fn from_diameter(a: &Point2<f64>, b: &Point2<f64>) -> Self {
        Circle {
            center: nalgebra::center(a, b),
            radius: distance(a, b) / 2.,
        }
    }

    /// Circle through three points. Collinear points fall back to the circle
    /// spanning the farthest pair.
    fn circumscribe(a: &Point2<f64>, b: &Point2<f64>, c: &Point2<f64>) -> Self {
        let ab = b - a;
        let ac = c - a;
        let d = 2. * (ab.x * ac.y - ab.y * ac.x);

        if d.abs() < f64::EPSILON {
            let pairs = [(a, b), (a, c), (b, c)];
            let (p, q) = pairs
                .iter()
                .copied()
                .max_by(|(p0, q0), (p1, q1)| distance(p0, q0).total_cmp(&distance(p1, q1)))
                .unwrap_or((a, b));

            return Self::from_diameter(p, q);
        }

        let ab_sq = ab.norm_squared();
        let ac_sq = ac.norm_squared();
        let ux = (ac.y * ab_sq - ab.y * ac_sq) / d;
        let uy = (ab.x * ac_sq - ac.x * ab_sq) / d;
        let center = Point2::new(a.x + ux, a.y + uy);

        Circle {
            center,
            radius: distance(&center, a),
        }
    }
}

/// Smallest circle enclosing every point (Welzl, iterative form).
///
/// Returns a zero-radius circle at the origin for an empty slice.
pub fn min_enclosing_circle(points: &[Point2<f64>]) -> Circle {
    let Some(first) = points.first() else {
        return Circle {
            center: Point2::origin(),
            radius: 0.,
        };
    };

    let mut circle = Circle {
        center: *first,
        radius: 0.,
    };

    for i in 1..points.len() {
        if circle.contains(&points[i]) {
            continue;
        }

        circle = Circle {
            center: points[i],
            radius: 0.,
        };

        for j in 0..i {
            if circle.contains(&points[j]) {
                continue;
            }

            circle = Circle::from_diameter(&points[i], &points[j]);

            for k in 0..j {
                if !circle.contains(&points[k]) {
                    circle = Circle::circumscribe(&points[i], &points[j], &points[k]);
                }
            }
        }
    }

    circle
}
