//! Default control schedules used when a caller does not supply one.

/// Unit-cell lengths tried by default.
pub fn default_unit_cells() -> Vec<u32> {
    vec![2, 4, 6, 8, 10]
}

/// Bond dimensions tried by default for field `g`, coupling `j` and unit
/// cell `length`.
///
/// Larger unit cells get a flat offset and the neighbourhood of the critical
/// point `g = J` gets a multiplier, since entanglement grows there.
pub fn default_bond_dimensions(g: f64, j: f64, length: u32) -> Vec<u32> {
    let mut values: Vec<u32> = vec![50, 80, 110, 140, 170];
    if length >= 4 {
        for value in &mut values {
            *value += 20;
        }
    }
    let distance = (g - j).abs();
    if distance < 0.1 {
        for value in &mut values {
            *value *= 2;
        }
    } else if distance < 0.4 {
        for value in &mut values {
            *value = *value * 3 / 2;
        }
    }
    values.sort_unstable();
    values.dedup();
    values
}

/// First value of [`default_bond_dimensions`].
pub fn default_refine_start(g: f64, j: f64, length: u32) -> u32 {
    default_bond_dimensions(g, j, length)
        .first()
        .copied()
        .unwrap_or(50)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn far_from_criticality_uses_the_base_list() {
        assert_eq!(default_bond_dimensions(0.2, 1.0, 2), vec![50, 80, 110, 140, 170]);
        assert_eq!(default_bond_dimensions(2.0, 1.0, 4), vec![70, 100, 130, 160, 190]);
    }

    #[test]
    fn critical_region_scales_up() {
        assert_eq!(default_bond_dimensions(1.05, 1.0, 2), vec![100, 160, 220, 280, 340]);
        assert_eq!(default_bond_dimensions(0.7, 1.0, 2), vec![75, 120, 165, 210, 255]);
        assert_eq!(default_refine_start(1.0, 1.0, 6), 140);
    }

    #[test]
    fn unit_cells_are_even_and_ascending() {
        let cells = default_unit_cells();
        assert!(cells.windows(2).all(|w| w[0] < w[1]));
        assert!(cells.iter().all(|c| c % 2 == 0));
    }
}
