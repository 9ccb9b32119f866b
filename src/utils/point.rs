use crate::{Errors, EstimateClose};
use anyhow::Result;
use nalgebra::{DMatrix, SVector};

/// Measurement in a D-dimensional Cartesian space (e.g. a pixel coordinate for `D = 2`)
pub type Point<const D: usize> = SVector<f32, D>;

/// 2D point constructor
///
pub fn point2(x: f32, y: f32) -> Point<2> {
    Point::<2>::new(x, y)
}

/// Squared euclidean distance between two points
///
pub fn squared_distance<const D: usize>(a: &Point<D>, b: &Point<D>) -> f32 {
    (a - b).norm_squared()
}

/// Converts a matrix where every row is a point into the list of points
///
/// # Parameters
/// * `m` - `N x D` matrix
///
pub fn points_from_matrix<const D: usize>(m: &DMatrix<f32>) -> Result<Vec<Point<D>>> {
    if m.ncols() != D {
        return Err(Errors::DimensionMismatch(0, m.ncols(), D).into());
    }
    Ok(m.row_iter()
        .map(|row| Point::<D>::from_iterator(row.iter().copied()))
        .collect())
}

/// Converts a list of coordinate vectors into the list of points
///
pub fn points_from_list<const D: usize>(list: &[Vec<f32>]) -> Result<Vec<Point<D>>> {
    list.iter()
        .enumerate()
        .map(|(i, coords)| -> Result<Point<D>> {
            if coords.len() != D {
                Err(Errors::DimensionMismatch(i, coords.len(), D).into())
            } else {
                Ok(Point::<D>::from_column_slice(coords))
            }
        })
        .collect()
}

impl<const D: usize> EstimateClose for Point<D> {
    fn almost_same(&self, other: &Self, eps: f32) -> bool {
        self.iter().zip(other.iter()).all(|(a, b)| (a - b).abs() < eps)
    }
}

#[cfg(test)]
mod tests {
    use crate::utils::point::{
        point2, points_from_list, points_from_matrix, squared_distance, Point,
    };
    use crate::{Errors, EstimateClose, EPS};
    use nalgebra::DMatrix;

    #[test]
    fn distances() {
        let d = squared_distance(&point2(0.0, 0.0), &point2(1.0, 1.0));
        assert!(d.almost_same(&2.0, EPS));
        let d = squared_distance(&point2(3.0, 4.0), &point2(3.0, 4.0));
        assert!(d.almost_same(&0.0, EPS));
    }

    #[test]
    fn from_matrix() {
        let m = DMatrix::from_row_slice(2, 2, &[0.0, 0.0, 10.0, 10.0]);
        let points = points_from_matrix::<2>(&m).unwrap();
        assert_eq!(points.len(), 2);
        assert!(points[1].almost_same(&point2(10.0, 10.0), EPS));

        let m = DMatrix::from_row_slice(1, 3, &[0.0, 0.0, 1.0]);
        let err = points_from_matrix::<2>(&m).unwrap_err();
        assert_eq!(
            err.downcast_ref::<Errors>(),
            Some(&Errors::DimensionMismatch(0, 3, 2))
        );

        let empty = DMatrix::<f32>::zeros(0, 3);
        let points = points_from_matrix::<3>(&empty).unwrap();
        assert!(points.is_empty());
    }

    #[test]
    fn from_list() {
        let points = points_from_list::<3>(&[vec![1.0, 2.0, 3.0]]).unwrap();
        assert!(points[0].almost_same(&Point::<3>::new(1.0, 2.0, 3.0), EPS));

        let err = points_from_list::<2>(&[vec![1.0, 2.0], vec![1.0]]).unwrap_err();
        assert_eq!(
            err.downcast_ref::<Errors>(),
            Some(&Errors::DimensionMismatch(1, 1, 2))
        );
    }
}
