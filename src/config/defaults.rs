//! Default configuration values

/// Manifest file name looked up in the project directory
pub const MANIFEST_FILE: &str = "modbuild.toml";

/// Build output directory, relative to the project root
pub const OUTPUT_DIR: &str = "build";

/// Executable stem when the manifest does not name one
pub const EXECUTABLE_NAME: &str = "main";

/// Compiler invoked when the manifest does not name one
pub const COMPILER: &str = "gcc";

/// Source file extensions picked up by discovery
pub const SOURCE_EXTENSIONS: &[&str] = &["c"];

/// Sources compiled into the final executable
pub const MAIN_SOURCES: &[&str] = &["main.c"];

/// Optimization and warning flags applied to every compile
pub const COMPILER_FLAGS: &[&str] = &[
    "-std=c17",
    "-O3",
    "-march=native",
    "-funroll-loops",
    "-Wall",
    "-Wextra",
    "-pedantic",
    "-Wno-deprecated-declarations",
];

/// Sequential builds unless asked otherwise
pub const BUILD_JOBS: usize = 1;

/// Minimum proptest iterations
pub const MIN_PROPTEST_ITERATIONS: u32 = 100;
