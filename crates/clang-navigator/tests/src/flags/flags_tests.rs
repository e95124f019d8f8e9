use super::*;

fn unique_temp_dir(name: &str) -> PathBuf {
    let nonce = std::time::SystemTime::now().duration_since(std::time::UNIX_EPOCH).expect("valid clock").as_nanos();
    std::env::temp_dir().join(format!("clang-navigator-flags-{name}-{}-{nonce}", std::process::id()))
}

#[test]
fn language_follows_the_extension() {
    assert_eq!(language_for(Path::new("a.c")), "c");
    assert_eq!(language_for(Path::new("a.m")), "objective-c");
    assert_eq!(language_for(Path::new("a.mm")), "objective-c++");
    assert_eq!(language_for(Path::new("a.cc")), "c++");
    assert_eq!(language_for(Path::new("a.h")), "c++");
}

#[test]
fn fallback_flags_use_settings() {
    let dir = unique_temp_dir("fallback");
    std::fs::create_dir_all(&dir).expect("temp dir");
    let settings = CompilerSettings {
        include_paths: vec!["/opt/include".to_string()],
        extra_flags: vec!["-std=c11".to_string()],
        ..CompilerSettings::default()
    };

    let flags = FlagsProvider::new().flags_for(&dir.join("main.c"), &settings);
    assert_eq!(flags.args, vec!["-x", "c", "-I", "/opt/include", "-std=c11"]);
    assert!(flags.working_dir.is_none());

    let _ = std::fs::remove_dir(dir);
}

#[test]
fn compile_database_flags_take_precedence() {
    let dir = unique_temp_dir("database");
    std::fs::create_dir_all(&dir).expect("temp dir");
    let source = dir.join("main.cpp");
    let database = serde_json::json!([{
        "directory": dir.display().to_string(),
        "file": "main.cpp",
        "arguments": ["clang++", "-DFROM_DB", "-c", "main.cpp"],
    }]);
    std::fs::write(dir.join(compile_database::COMPILE_DATABASE_FILENAME), database.to_string()).expect("write db");

    let provider = FlagsProvider::new();
    let flags = provider.flags_for(&source, &CompilerSettings::default());
    assert_eq!(flags.args, vec!["-DFROM_DB"]);
    assert_eq!(flags.working_dir.as_deref(), Some(dir.as_path()));

    let disabled = CompilerSettings {
        compile_commands: false,
        ..CompilerSettings::default()
    };
    assert_eq!(provider.flags_for(&source, &disabled).args, vec!["-x", "c++"]);

    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn clear_forgets_cached_databases() {
    let dir = unique_temp_dir("clear");
    std::fs::create_dir_all(&dir).expect("temp dir");
    let source = dir.join("main.cpp");
    let db_path = dir.join(compile_database::COMPILE_DATABASE_FILENAME);
    let write_db = |define: &str| {
        let database = serde_json::json!([{
            "directory": dir.display().to_string(),
            "file": "main.cpp",
            "arguments": ["clang++", define, "main.cpp"],
        }]);
        std::fs::write(&db_path, database.to_string()).expect("write db");
    };

    let provider = FlagsProvider::new();
    write_db("-DOLD");
    assert_eq!(provider.flags_for(&source, &CompilerSettings::default()).args, vec!["-DOLD"]);

    write_db("-DNEW");
    assert_eq!(provider.flags_for(&source, &CompilerSettings::default()).args, vec!["-DOLD"]);

    provider.clear();
    assert_eq!(provider.flags_for(&source, &CompilerSettings::default()).args, vec!["-DNEW"]);

    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn unreadable_database_falls_back() {
    let dir = unique_temp_dir("broken");
    std::fs::create_dir_all(&dir).expect("temp dir");
    std::fs::write(dir.join(compile_database::COMPILE_DATABASE_FILENAME), "not json").expect("write db");

    let flags = FlagsProvider::new().flags_for(&dir.join("main.cpp"), &CompilerSettings::default());
    assert_eq!(flags.args, vec!["-x", "c++"]);

    let _ = std::fs::remove_dir_all(dir);
}
