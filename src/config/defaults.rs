//! Default configuration values

/// Recipe declaration file name
pub const RECIPE_FILE: &str = "recipe.toml";

/// Version stamp location relative to the source root
pub const VERSION_STAMP_PATH: &str = "cmake/version.cmake";

/// Output subdirectory holding build trees
pub const BUILD_SUBDIR: &str = "build";

/// Generated descriptors, below the build dir
pub const GENERATORS_SUBDIR: &str = "generators";

/// Output subdirectory holding installed packages
pub const PACKAGE_SUBDIR: &str = "package";

/// Output subdirectory holding exported sources for `create`
pub const EXPORT_SUBDIR: &str = "export";

/// Hex characters kept from the package id digest
pub const PACKAGE_ID_LEN: usize = 16;

/// Toolchain descriptor file name
pub const TOOLCHAIN_FILE: &str = "toolchain.cmake";

/// Dependency descriptor file name
pub const DEPENDENCIES_FILE: &str = "dependencies.json";

/// Run environment script name
pub const RUN_ENV_FILE: &str = "runenv.sh";

/// Package description written into the package dir
pub const PACKAGE_INFO_FILE: &str = "package-info.json";

/// Default build tool executable
pub const DEFAULT_CMAKE: &str = "cmake";

/// Output root relative to the recipe directory when none is configured
pub const DEFAULT_OUTPUT_DIR: &str = "out";
