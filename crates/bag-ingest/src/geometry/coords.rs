//! Coordinate list parsing

use geo_types::Coord;

use super::GeometryError;

/// Parse whitespace separated numbers, rejecting anything non-finite
pub fn parse_values(text: &str) -> Result<Vec<f64>, GeometryError> {
    text.split_whitespace()
        .map(|token| match token.parse::<f64>() {
            Ok(value) if value.is_finite() => Ok(value),
            _ => Err(GeometryError::InvalidCoordinate(token.to_string())),
        })
        .collect()
}

/// Group a flat value list into positions of `dimension` values, keeping x and y
pub fn to_coords(values: &[f64], dimension: usize) -> Result<Vec<Coord<f64>>, GeometryError> {
    if dimension < 2 {
        return Err(GeometryError::InvalidDimension(dimension));
    }
    if values.len() % dimension != 0 {
        return Err(GeometryError::OddCoordinateCount {
            values: values.len(),
            dimension,
        });
    }

    Ok(values
        .chunks_exact(dimension)
        .map(|position| Coord {
            x: position[0],
            y: position[1],
        })
        .collect())
}

/// Parse the GML2 `coordinates` form: tuples split by whitespace, values by commas
pub fn parse_tuples(text: &str) -> Result<Vec<Coord<f64>>, GeometryError> {
    text.split_whitespace()
        .map(|tuple| {
            let values = parse_values(&tuple.replace(',', " "))?;
            match values.as_slice() {
                [x, y, ..] => Ok(Coord { x: *x, y: *y }),
                _ => Err(GeometryError::InvalidCoordinate(tuple.to_string())),
            }
        })
        .collect()
}

/// Append the first position when the ring is not closed
pub fn close_ring(ring: &mut Vec<Coord<f64>>) {
    if let (Some(first), Some(last)) = (ring.first().copied(), ring.last().copied()) {
        if first != last {
            ring.push(first);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_values() {
        assert_eq!(parse_values(" 1 2.5\n-3e2 ").unwrap(), vec![1.0, 2.5, -300.0]);
        assert!(parse_values("").unwrap().is_empty());
        assert!(matches!(
            parse_values("1 NaN"),
            Err(GeometryError::InvalidCoordinate(t)) if t == "NaN"
        ));
        assert!(parse_values("1 inf").is_err());
        assert!(parse_values("1,5 2").is_err());
    }

    #[test]
    fn test_to_coords_flattens() {
        let coords = to_coords(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 3).unwrap();
        assert_eq!(coords, vec![Coord { x: 1.0, y: 2.0 }, Coord { x: 4.0, y: 5.0 }]);
        assert!(matches!(
            to_coords(&[1.0, 2.0, 3.0], 2),
            Err(GeometryError::OddCoordinateCount { values: 3, dimension: 2 })
        ));
        assert!(matches!(
            to_coords(&[1.0], 1),
            Err(GeometryError::InvalidDimension(1))
        ));
    }

    #[test]
    fn test_parse_tuples() {
        let coords = parse_tuples("1,2 3,4,9").unwrap();
        assert_eq!(coords, vec![Coord { x: 1.0, y: 2.0 }, Coord { x: 3.0, y: 4.0 }]);
        assert!(parse_tuples("1 2").is_err());
    }

    #[test]
    fn test_close_ring() {
        let mut ring = vec![Coord { x: 0.0, y: 0.0 }, Coord { x: 1.0, y: 0.0 }];
        close_ring(&mut ring);
        assert_eq!(ring.len(), 3);
        close_ring(&mut ring);
        assert_eq!(ring.len(), 3);

        let mut empty = Vec::new();
        close_ring(&mut empty);
        assert!(empty.is_empty());
    }

    proptest! {
        #[test]
        fn prop_positions_keep_x_and_y(
            positions in prop::collection::vec((-1e6f64..1e6, -1e6f64..1e6, -100f64..100.0), 0..50),
            dimension in 2usize..=3,
        ) {
            let mut text = String::new();
            for (x, y, z) in &positions {
                text.push_str(&format!("{x} {y} "));
                if dimension == 3 {
                    text.push_str(&format!("{z} "));
                }
            }

            let coords = to_coords(&parse_values(&text).unwrap(), dimension).unwrap();
            prop_assert_eq!(coords.len(), positions.len());
            for (coord, (x, y, _)) in coords.iter().zip(&positions) {
                prop_assert_eq!(coord.x, *x);
                prop_assert_eq!(coord.y, *y);
            }
        }
    }
}
