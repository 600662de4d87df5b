/// Name of the application, used for the config file and env var prefixes.
pub const APP_NAME: &str = "kiln";

/// Project configuration file looked up at the project root.
pub const CONFIG_FILENAME: &str = "kiln.toml";

/// Default build directory, relative to the project root.
pub const DEFAULT_BUILD_DIR: &str = "bin";

/// Subdirectory of the build directory holding per-target object trees.
pub const OBJECTS_DIR: &str = "objs";

/// Suffix appended to shader sources to name their bytecode.
pub const SHADER_ARTIFACT_SUFFIX: &str = ".spv";

/// Extension that replaces native source extensions for object files.
pub const OBJECT_EXTENSION: &str = "o";

/// Environment variable overriding the compile worker pool size.
pub const JOBS_ENV: &str = "KILN_JOBS";

/// Environment variable overriding the C compiler driver.
pub const CC_ENV: &str = "KILN_CC";

/// Environment variable overriding the shader compiler.
pub const SHADER_COMPILER_ENV: &str = "KILN_SHADER_COMPILER";
