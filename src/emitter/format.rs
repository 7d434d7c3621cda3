use crate::visibility::VisibleSatellite;

/// Builds the status line `"id: tag, id: tag"` ordered by NORAD id.
///
/// Returns an empty string when nothing is visible.
pub fn format_line(visible: &[VisibleSatellite]) -> String {
    let mut sorted: Vec<&VisibleSatellite> = visible.iter().collect();
    sorted.sort_by_key(|s| s.norad_id);
    sorted
        .iter()
        .map(|s| format!("{}: {}", s.norad_id, s.tag))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sat(norad_id: u32, tag: &str) -> VisibleSatellite {
        VisibleSatellite {
            norad_id,
            tag: tag.to_string(),
        }
    }

    #[test]
    fn sorts_by_id() {
        let line = format_line(&[sat(48915, "pink"), sat(25544, "blue")]);
        assert_eq!(line, "25544: blue, 48915: pink");
    }

    #[test]
    fn single_and_empty() {
        assert_eq!(format_line(&[sat(1, "red")]), "1: red");
        assert_eq!(format_line(&[]), "");
    }
}
