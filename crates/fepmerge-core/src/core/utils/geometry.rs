use nalgebra::{Isometry3, Matrix3, Point3, Rotation3, Translation3, UnitQuaternion, Vector3};

/// The optimal rigid-body fit of one point set onto another.
#[derive(Debug, Clone, PartialEq)]
pub struct Superposition {
    /// Transform that maps mobile coordinates into the reference frame.
    pub isometry: Isometry3<f64>,
    /// RMSD between the transformed mobile points and the reference points.
    pub rmsd: f64,
}

pub fn centroid(points: &[Point3<f64>]) -> Option<Point3<f64>> {
    if points.is_empty() {
        return None;
    }
    let sum = points
        .iter()
        .fold(Vector3::zeros(), |acc, p| acc + p.coords);
    Some(Point3::from(sum / points.len() as f64))
}

pub fn calculate_rmsd(coords1: &[Point3<f64>], coords2: &[Point3<f64>]) -> Option<f64> {
    if coords1.len() != coords2.len() || coords1.is_empty() {
        return None;
    }
    let n = coords1.len() as f64;
    let squared_dist_sum: f64 = coords1
        .iter()
        .zip(coords2.iter())
        .map(|(p1, p2)| (p1 - p2).norm_squared())
        .sum();
    Some((squared_dist_sum / n).sqrt())
}

/// Kabsch superposition of `mobile` onto `reference` (paired by position).
///
/// A single pair yields a pure translation. The rotation is corrected for
/// reflections so the result is always a proper rigid-body motion.
///
/// # Return
///
/// Returns `None` if the slices differ in length, are empty, or the SVD fails.
pub fn superpose(mobile: &[Point3<f64>], reference: &[Point3<f64>]) -> Option<Superposition> {
    if mobile.len() != reference.len() || mobile.is_empty() {
        return None;
    }
    let mobile_center = centroid(mobile)?;
    let reference_center = centroid(reference)?;

    let rotation = if mobile.len() == 1 {
        Rotation3::identity()
    } else {
        let mut h = Matrix3::zeros();
        for (m, r) in mobile.iter().zip(reference) {
            h += (m - mobile_center) * (r - reference_center).transpose();
        }

        let svd = h.svd(true, true);
        let u = svd.u?;
        let v = svd.v_t?.transpose();

        let mut r = v * u.transpose();
        if r.determinant() < 0.0 {
            let mut v_corrected = v;
            for i in 0..3 {
                v_corrected[(i, 2)] = -v_corrected[(i, 2)];
            }
            r = v_corrected * u.transpose();
        }
        Rotation3::from_matrix_unchecked(r)
    };

    let translation = reference_center.coords - rotation * mobile_center.coords;
    let isometry = Isometry3::from_parts(
        Translation3::from(translation),
        UnitQuaternion::from_rotation_matrix(&rotation),
    );

    let moved: Vec<Point3<f64>> = mobile.iter().map(|p| isometry * p).collect();
    let rmsd = calculate_rmsd(&moved, reference)?;

    Some(Superposition { isometry, rmsd })
}
