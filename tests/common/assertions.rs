/// FFmpeg command assertion utilities
use ffplan::engine::InvocationPlan;

/// Check if a command string contains a specific flag or fragment
#[allow(dead_code)]
pub fn assert_cmd_contains(cmd: &str, flag: &str) {
    assert!(
        cmd.contains(flag),
        "Expected FFmpeg command to contain '{}' but it didn't.\nCommand: {}",
        flag,
        cmd
    );
}

/// Check if a command string does NOT contain a specific flag
#[allow(dead_code)]
pub fn assert_cmd_not_contains(cmd: &str, flag: &str) {
    assert!(
        !cmd.contains(flag),
        "Expected FFmpeg command to NOT contain '{}' but it did.\nCommand: {}",
        flag,
        cmd
    );
}

/// Check if a plan passes `flag` followed directly by `value`
#[allow(dead_code)]
pub fn assert_plan_has_flag_value(plan: &InvocationPlan, flag: &str, value: &str) {
    assert_eq!(
        get_flag_value(plan, flag),
        Some(value),
        "Expected '{} {}' in plan '{}'.\nArgs: {:?}",
        flag,
        value,
        plan.name,
        plan.args
    );
}

/// Value token following the first occurrence of `flag`
#[allow(dead_code)]
pub fn get_flag_value<'a>(plan: &'a InvocationPlan, flag: &str) -> Option<&'a str> {
    plan.args
        .iter()
        .position(|a| a == flag)
        .and_then(|i| plan.args.get(i + 1))
        .map(String::as_str)
}

/// Number of times a token appears in the argument vector
#[allow(dead_code)]
pub fn count_token(plan: &InvocationPlan, token: &str) -> usize {
    plan.args.iter().filter(|a| *a == token).count()
}

/// No argument may be empty or whitespace-only, and no joined list may carry doubled separators
#[allow(dead_code)]
pub fn assert_well_formed(plan: &InvocationPlan) {
    assert!(!plan.executable.trim().is_empty(), "empty executable");
    for arg in &plan.args {
        assert!(
            !arg.trim().is_empty(),
            "Empty token in plan '{}': {:?}",
            plan.name,
            plan.args
        );
    }
    for flag in ["-vf", "-x264-params", "-x265-params", "-svtav1-params", "-rav1e-params"] {
        if let Some(value) = get_flag_value(plan, flag) {
            let sep = if flag == "-vf" { ',' } else { ':' };
            assert!(
                !value.starts_with(sep) && !value.ends_with(sep),
                "Stray separator in {} {}",
                flag,
                value
            );
            assert!(
                !value.contains(&format!("{}{}", sep, sep)),
                "Doubled separator in {} {}",
                flag,
                value
            );
        }
    }
}

/// Assert that mutually exclusive flags are not both present
#[allow(dead_code)]
pub fn assert_mutually_exclusive(plan: &InvocationPlan, flag1: &str, flag2: &str) {
    let has_flag1 = plan.args.iter().any(|a| a == flag1);
    let has_flag2 = plan.args.iter().any(|a| a == flag2);

    assert!(
        !(has_flag1 && has_flag2),
        "Mutually exclusive flags '{}' and '{}' both found in plan: {:?}",
        flag1,
        flag2,
        plan.args
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn plan(args: &[&str]) -> InvocationPlan {
        InvocationPlan {
            name: "Single pass CRF".to_string(),
            executable: "ffmpeg".to_string(),
            args: args.iter().map(|s| s.to_string()).collect(),
            abort_on_failure: false,
            tags: BTreeSet::new(),
        }
    }

    #[test]
    fn test_get_flag_value() {
        let p = plan(&["-i", "input.mp4", "-crf", "30", "-b:v", "2000k", "output.webm"]);
        assert_eq!(get_flag_value(&p, "-crf"), Some("30"));
        assert_eq!(get_flag_value(&p, "-b:v"), Some("2000k"));
        assert_eq!(get_flag_value(&p, "-nonexistent"), None);
    }

    #[test]
    fn test_assert_cmd_contains() {
        let cmd = "ffmpeg -i input.mp4 -c:v:0 libx264";
        assert_cmd_contains(cmd, "-c:v:0");
        assert_cmd_contains(cmd, "libx264");
    }

    #[test]
    #[should_panic(expected = "Expected FFmpeg command to contain")]
    fn test_assert_cmd_contains_fails() {
        let cmd = "ffmpeg -i input.mp4";
        assert_cmd_contains(cmd, "-nonexistent");
    }

    #[test]
    #[should_panic(expected = "Doubled separator")]
    fn test_well_formed_catches_doubled_separator() {
        assert_well_formed(&plan(&["-vf", "yadif,,scale=1:1"]));
    }
}
