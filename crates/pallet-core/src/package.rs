//! Package identity and definition types.

use crate::specifier::VersionSpecifier;
use crate::version::SemanticVersion;
use serde::{Deserialize, Serialize};
use std::fmt;

/// CPU architecture a package build targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CpuArchitecture {
    /// No architecture declared.
    #[default]
    Unspecified,
    /// Architecture-independent build.
    AnyCpu,
    /// 32-bit x86.
    X86,
    /// 64-bit x86.
    X64,
    /// 32-bit ARM.
    Arm,
    /// 64-bit ARM.
    Arm64,
}

impl CpuArchitecture {
    /// Whether a build for `self` can run where `other` is expected.
    ///
    /// `Unspecified` and `AnyCpu` are compatible with everything, in either
    /// position.
    #[must_use]
    pub fn is_compatible_with(self, other: Self) -> bool {
        use CpuArchitecture::{AnyCpu, Unspecified};
        matches!(self, Unspecified | AnyCpu) || matches!(other, Unspecified | AnyCpu) || self == other
    }
}

impl fmt::Display for CpuArchitecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unspecified => write!(f, "unspecified"),
            Self::AnyCpu => write!(f, "anycpu"),
            Self::X86 => write!(f, "x86"),
            Self::X64 => write!(f, "x64"),
            Self::Arm => write!(f, "arm"),
            Self::Arm64 => write!(f, "arm64"),
        }
    }
}

/// Case-insensitive match of an OS name against a comma-separated list of
/// acceptable names. An empty declaration accepts every OS.
#[must_use]
pub fn os_matches(declared: &str, os: &str) -> bool {
    let declared = declared.trim();
    if declared.is_empty() {
        return true;
    }
    declared
        .split(',')
        .map(str::trim)
        .any(|entry| entry.eq_ignore_ascii_case(os) || entry.eq_ignore_ascii_case("any"))
}

/// Concrete identity of a package build: name, version, architecture, OS.
///
/// Structural equality over all four fields; usable as a map key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PackageIdentifier {
    /// Package name.
    pub name: String,
    /// Resolved version; `None` marks a package known only by name.
    pub version: Option<SemanticVersion>,
    /// Target CPU architecture.
    pub architecture: CpuArchitecture,
    /// Target OS (may be a comma-separated list of names).
    pub os: String,
}

impl fmt::Display for PackageIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(version) => write!(f, "{}@{}", self.name, version)?,
            None => write!(f, "{}@?", self.name)?,
        }
        write!(f, " ({}/{})", self.architecture, self.os)
    }
}

/// A package query: which packages are acceptable, not which one was chosen.
///
/// `name: None` means "any package name" and is only meaningful for catalog
/// listing, never for resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageSpecifier {
    /// Package name, or `None` for any.
    pub name: Option<String>,
    /// Acceptable version range.
    pub version: VersionSpecifier,
    /// Required architecture.
    pub architecture: CpuArchitecture,
    /// Required OS, or `None` for any.
    pub os: Option<String>,
}

impl PackageSpecifier {
    /// Query for any version of a named package on any platform.
    #[must_use]
    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            version: VersionSpecifier::any(),
            architecture: CpuArchitecture::Unspecified,
            os: None,
        }
    }

    /// Narrow the query to a version range.
    #[must_use]
    pub fn with_version(mut self, version: VersionSpecifier) -> Self {
        self.version = version;
        self
    }

    /// Narrow the query to a platform.
    #[must_use]
    pub fn with_platform(mut self, architecture: CpuArchitecture, os: impl Into<String>) -> Self {
        self.architecture = architecture;
        self.os = Some(os.into());
        self
    }

    /// Whether a package definition satisfies this query.
    #[must_use]
    pub fn matches(&self, def: &PackageDef) -> bool {
        if let Some(name) = &self.name {
            if *name != def.name {
                return false;
            }
        }
        if !self.version.is_compatible(def.version.as_ref()) {
            return false;
        }
        if !self.architecture.is_compatible_with(def.architecture) {
            return false;
        }
        match &self.os {
            Some(os) => os_matches(&def.os, os),
            None => true,
        }
    }
}

impl From<&PackageDependency> for PackageSpecifier {
    fn from(dep: &PackageDependency) -> Self {
        Self::by_name(dep.name.clone()).with_version(dep.version.clone())
    }
}

impl fmt::Display for PackageSpecifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}",
            self.name.as_deref().unwrap_or("*"),
            self.version
        )
    }
}

/// A dependency edge declared by a package: a name plus a version range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageDependency {
    /// Name of the required package.
    pub name: String,
    /// Acceptable versions of the required package.
    pub version: VersionSpecifier,
}

impl PackageDependency {
    /// Create a dependency edge.
    #[must_use]
    pub fn new(name: impl Into<String>, version: VersionSpecifier) -> Self {
        Self {
            name: name.into(),
            version,
        }
    }
}

impl fmt::Display for PackageDependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.version)
    }
}

/// Full definition of a candidate package: identity plus declared
/// dependencies.
///
/// Produced by a manifest loader or repository; the resolvers treat it as a
/// read-only record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageDef {
    /// Package name.
    pub name: String,
    /// Version; `None` marks a placeholder for a package that could not be
    /// found.
    pub version: Option<SemanticVersion>,
    /// Target CPU architecture.
    #[serde(default)]
    pub architecture: CpuArchitecture,
    /// Target OS names, comma-separated; empty accepts every OS.
    #[serde(default)]
    pub os: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// Declared dependencies.
    #[serde(default)]
    pub dependencies: Vec<PackageDependency>,
}

impl PackageDef {
    /// Create a minimal package definition.
    #[must_use]
    pub fn new(name: impl Into<String>, version: SemanticVersion) -> Self {
        Self {
            name: name.into(),
            version: Some(version),
            architecture: CpuArchitecture::default(),
            os: String::new(),
            description: String::new(),
            dependencies: Vec::new(),
        }
    }

    /// Placeholder definition for a package known only by name.
    #[must_use]
    pub fn placeholder(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: None,
            architecture: CpuArchitecture::default(),
            os: String::new(),
            description: String::new(),
            dependencies: Vec::new(),
        }
    }

    /// Add a dependency edge.
    #[must_use]
    pub fn with_dependency(mut self, name: impl Into<String>, version: VersionSpecifier) -> Self {
        self.dependencies.push(PackageDependency::new(name, version));
        self
    }

    /// Set the target platform.
    #[must_use]
    pub fn with_platform(mut self, architecture: CpuArchitecture, os: impl Into<String>) -> Self {
        self.architecture = architecture;
        self.os = os.into();
        self
    }

    /// The structural identity of this definition.
    #[must_use]
    pub fn identifier(&self) -> PackageIdentifier {
        PackageIdentifier {
            name: self.name.clone(),
            version: self.version.clone(),
            architecture: self.architecture,
            os: self.os.clone(),
        }
    }

    /// Whether this build can run on the given OS.
    #[must_use]
    pub fn supports_os(&self, os: &str) -> bool {
        os_matches(&self.os, os)
    }
}

impl fmt::Display for PackageDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(version) => write!(f, "{}@{}", self.name, version),
            None => write!(f, "{}@?", self.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> SemanticVersion {
        SemanticVersion::parse(s).expect("test version should parse")
    }

    #[test]
    fn architecture_compatibility() {
        use CpuArchitecture::{AnyCpu, Arm64, Unspecified, X64, X86};
        assert!(AnyCpu.is_compatible_with(X64));
        assert!(X64.is_compatible_with(AnyCpu));
        assert!(Unspecified.is_compatible_with(Arm64));
        assert!(X64.is_compatible_with(X64));
        assert!(!X64.is_compatible_with(X86));
    }

    #[test]
    fn os_list_matching() {
        assert!(os_matches("", "linux"));
        assert!(os_matches("Linux", "linux"));
        assert!(os_matches("Windows, Linux", "linux"));
        assert!(os_matches("any", "macos"));
        assert!(!os_matches("Windows", "linux"));
    }

    #[test]
    fn identifier_equality_is_structural() {
        let a = PackageDef::new("demo", v("1.0.0")).identifier();
        let b = PackageDef::new("demo", v("1.0.0")).identifier();
        let c = PackageDef::new("demo", v("1.0.1")).identifier();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn specifier_matches_definition() {
        let def = PackageDef::new("demo", v("1.4.0"))
            .with_platform(CpuArchitecture::X64, "Linux");

        let query = PackageSpecifier::by_name("demo")
            .with_version(VersionSpecifier::parse("^1.2").unwrap());
        assert!(query.matches(&def));

        let wrong_os = query.clone().with_platform(CpuArchitecture::X64, "Windows");
        assert!(!wrong_os.matches(&def));

        let wrong_version =
            PackageSpecifier::by_name("demo").with_version(VersionSpecifier::parse("^2.0").unwrap());
        assert!(!wrong_version.matches(&def));
    }

    #[test]
    fn specifier_from_dependency() {
        let dep = PackageDependency::new("demo", VersionSpecifier::parse("^1.0").unwrap());
        let query = PackageSpecifier::from(&dep);
        assert_eq!(query.name.as_deref(), Some("demo"));
        assert!(query.matches(&PackageDef::new("demo", v("1.9.0"))));
    }

    #[test]
    fn serde_round_trip() {
        let def = PackageDef::new("demo", v("1.2.3-rc.1"))
            .with_platform(CpuArchitecture::Arm64, "Linux")
            .with_dependency("base", VersionSpecifier::parse("^1.0").unwrap());
        let json = serde_json::to_string(&def).expect("serialize");
        let back: PackageDef = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(def, back);
    }
}
