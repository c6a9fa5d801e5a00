use nbis_bozorth::BozorthParams;
use nbis_cli::{EngineSettings, Nbis, NbisConfig};
use nbis_lfs::LfsParams;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("🔧 Engine Settings Serialization Demo");
    println!("=====================================\n");

    // Demo 1: Create settings
    println!("📋 Demo 1: Creating Settings");
    let fast = EngineSettings::new(NbisConfig::default().with_threads(2))
        .with_detector(LfsParams::fast_preset().with_metadata("Production Fast", "Large blocks, short traces"));
    let sensitive = EngineSettings::new(NbisConfig::default().with_ppi(1000))
        .with_detector(LfsParams::sensitive_preset())
        .with_matcher(BozorthParams::default().with_angle_tolerance(14.0));
    println!("{}\n", fast.summary());
    println!("{}", sensitive.summary());

    // Demo 2: JSON
    println!("\n📄 Demo 2: JSON Serialization");
    let json = fast.to_json()?;
    println!("   First 200 chars:");
    println!("   {}", &json[..200.min(json.len())]);
    fast.save("fast_settings.json")?;
    println!("   ✅ Saved fast_settings.json");

    // Demo 3: TOML
    println!("\n📋 Demo 3: TOML Serialization");
    let toml_str = sensitive.to_toml()?;
    println!("   First 300 chars:");
    println!("   {}", &toml_str[..300.min(toml_str.len())]);
    sensitive.save("sensitive_settings.toml")?;
    println!("   ✅ Saved sensitive_settings.toml");

    // Demo 4: Load back and build engines
    println!("\n🔄 Demo 4: Loading Settings");
    for path in ["fast_settings.json", "sensitive_settings.toml"] {
        let loaded = EngineSettings::load(path)?;
        let engine = Nbis::from_settings(loaded)?;
        println!("   • {} -> {:?}", path, engine);
    }

    // Demo 5: Validation
    println!("\n🛡️  Demo 5: Validation");
    match EngineSettings::from_json(r#"{"nbis": {"matcher": {"max_minutiae": 0}}}"#) {
        Ok(_) => println!("   ❌ invalid settings were accepted"),
        Err(e) => println!("   ✅ rejected: {}", e),
    }

    std::fs::remove_file("fast_settings.json").ok();
    std::fs::remove_file("sensitive_settings.toml").ok();
    println!("\n🧹 Cleaned up");
    Ok(())
}
