//! Aim command handler

use crate::commands::{AimArgs, AimFormat};
use crate::error::CliResult;
use lyra_smoke::{aim_rotation, EulerRotation3};

/// Solve and render the rotation for `args`
pub fn execute_aim(args: &AimArgs) -> CliResult<String> {
    let rotation = aim_rotation(args.from, args.to)?;
    render_rotation(&rotation, args.format)
}

/// Render a rotation in the requested format
pub fn render_rotation(rotation: &EulerRotation3, format: AimFormat) -> CliResult<String> {
    Ok(match format {
        AimFormat::Text => format!(
            "pitch={:.6} yaw={:.6} roll={:.6}",
            rotation.pitch, rotation.yaw, rotation.roll
        ),
        AimFormat::Json => serde_json::to_string(rotation).map_err(lyra_smoke::SmokeError::from)?,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use lyra_smoke::Position3;

    fn args(to: Position3, format: AimFormat) -> AimArgs {
        AimArgs {
            from: Position3::new(0.0, 0.0, 0.0),
            to,
            format,
        }
    }

    #[test]
    fn test_text_output() {
        let out = execute_aim(&args(Position3::new(500.0, 500.0, -200.0), AimFormat::Text)).unwrap();
        assert_eq!(out, "pitch=15.793169 yaw=45.000000 roll=0.000000");
    }

    #[test]
    fn test_json_output() {
        let out = execute_aim(&args(Position3::new(0.0, 0.0, 100.0), AimFormat::Json)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["pitch"], -90.0);
        assert_eq!(value["yaw"], 0.0);
    }

    #[test]
    fn test_coincident_points_error() {
        let err = execute_aim(&args(Position3::new(0.0, 0.0, 0.0), AimFormat::Text)).unwrap_err();
        assert!(err.to_string().contains("Invalid input"));
    }
}
