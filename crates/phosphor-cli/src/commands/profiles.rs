use phosphor_core::IntensityProfile;

pub fn run(json: bool) {
    if json {
        match serde_json::to_string_pretty(&profiles_json()) {
            Ok(s) => println!("{s}"),
            Err(e) => super::fail(e),
        }
        return;
    }

    println!(
        "  {:<9} {:<18} {:>6} {:>4} {:>6} {:>7} {:>7} {:>9}  roll",
        "profile", "", "scan", "gap", "noise", "flicker", "glitch", "vignette"
    );
    for p in IntensityProfile::ALL {
        let e = p.params();
        let marker = if p == IntensityProfile::default() { "*" } else { " " };
        println!(
            "{marker} {:<9} {:<18} {:>6.2} {:>4} {:>6.2} {:>7.2} {:>7.3} {:>9.2}  {}",
            p.to_string(),
            p.description(),
            e.scanline_opacity,
            e.scanline_gap,
            e.noise_opacity,
            e.flicker_intensity,
            e.glitch_frequency,
            e.vignette,
            if e.vertical_roll { "yes" } else { "no" }
        );
    }
    println!("\n  * default. Pick one with `phosphor run --intensity <profile>`.");
}

fn profiles_json() -> serde_json::Value {
    let rows: Vec<serde_json::Value> = IntensityProfile::ALL
        .iter()
        .map(|&p| {
            let e = p.params();
            serde_json::json!({
                "profile": p,
                "label": p.label(),
                "description": p.description(),
                "level": p.level(),
                "scanline_opacity": e.scanline_opacity,
                "scanline_gap": e.scanline_gap,
                "noise_opacity": e.noise_opacity,
                "flicker_intensity": e.flicker_intensity,
                "glitch_frequency": e.glitch_frequency,
                "vignette": e.vignette,
                "phosphor_glow": e.phosphor_glow,
                "curvature": e.curvature,
                "screen_dirt": e.screen_dirt,
                "tracking_period_ms": e.tracking_period_ms,
                "vertical_roll": e.vertical_roll,
            })
        })
        .collect();
    serde_json::Value::Array(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_lists_every_profile_in_order() {
        let v = profiles_json();
        let names: Vec<&str> = v
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["profile"].as_str().unwrap())
            .collect();
        assert_eq!(names, ["soft", "normal", "strong", "extreme"]);
        assert_eq!(v[3]["vertical_roll"], true);
        assert_eq!(v[0]["scanline_gap"], 3);
    }
}
