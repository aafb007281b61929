/// Maps instants (unix seconds) onto the nearest timestamp index.
///
/// Instants outside the first..=last timestamp are dropped. The result is
/// sorted and free of duplicates.
pub fn marker_indices(timestamps: &[i64], instants: &[i64]) -> Vec<usize> {
    let (Some(&first), Some(&last)) = (timestamps.first(), timestamps.last()) else {
        return Vec::new();
    };
    let mut out: Vec<usize> = instants
        .iter()
        .filter(|&&at| at >= first && at <= last)
        .map(|&at| match timestamps.binary_search(&at) {
            Ok(idx) => idx,
            Err(pos) => {
                // pos is in 1..len because `at` lies strictly inside the axis.
                let before = timestamps[pos - 1];
                let after = timestamps[pos];
                if at - before <= after - at {
                    pos - 1
                } else {
                    pos
                }
            }
        })
        .collect();
    out.sort_unstable();
    out.dedup();
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snaps_to_nearest_point() {
        let ts = [100, 200, 300, 400];
        assert_eq!(marker_indices(&ts, &[260, 140, 300]), vec![0, 2]);
    }

    #[test]
    fn ties_go_to_the_earlier_point() {
        assert_eq!(marker_indices(&[100, 200], &[150]), vec![0]);
    }

    #[test]
    fn drops_out_of_range_instants() {
        assert_eq!(marker_indices(&[100, 200], &[50, 250]), Vec::<usize>::new());
        assert!(marker_indices(&[], &[100]).is_empty());
    }
}
