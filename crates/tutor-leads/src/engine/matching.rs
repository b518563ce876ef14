//! Pure eligibility predicate deciding whether a tutor may be shown a
//! requirement. Set intersection only; ranking and relevance live elsewhere.

use super::domain::{MatchingProfile, RequirementDetails, TeachingMode};

/// True when the profile intersects the requirement on subject AND
/// (grade level OR board) AND at least one compatible teaching mode.
///
/// Online requirements match tutors offering online delivery; offline
/// requirements additionally need the tutor's service areas to cover the
/// requirement's location.
pub fn profile_matches(profile: &MatchingProfile, requirement: &RequirementDetails) -> bool {
    if !intersects(&profile.subjects, &requirement.subjects) {
        return false;
    }

    let grade_ok = contains(&profile.grade_levels, &requirement.grade_level);
    let board_ok = contains(&profile.boards, &requirement.board);
    if !grade_ok && !board_ok {
        return false;
    }

    requirement
        .modes
        .iter()
        .any(|mode| mode_compatible(profile, *mode, &requirement.location))
}

fn mode_compatible(profile: &MatchingProfile, mode: TeachingMode, location: &str) -> bool {
    match mode {
        TeachingMode::Online => profile.modes.contains(&TeachingMode::Online),
        TeachingMode::Offline => {
            profile.modes.contains(&TeachingMode::Offline)
                && contains(&profile.service_areas, location)
        }
    }
}

fn normalize(value: &str) -> String {
    value.trim().to_ascii_lowercase()
}

fn contains(values: &[String], needle: &str) -> bool {
    let needle = normalize(needle);
    values.iter().any(|value| normalize(value) == needle)
}

fn intersects(values: &[String], needles: &[String]) -> bool {
    needles.iter().any(|needle| contains(values, needle))
}
