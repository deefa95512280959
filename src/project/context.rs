//! Build configuration.
//!
//! [`BuildContext`] describes where packages are searched and which files
//! are buildable. It is immutable once handed to a session; changing the
//! configuration goes through [`Versioned`], which starts a new generation
//! so that caches keyed on the old configuration are dropped.

use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Operating systems known to file name and build tag matching.
pub const KNOWN_OS: &[&str] = &[
    "aix", "android", "darwin", "dragonfly", "freebsd", "hurd", "illumos", "ios", "js", "linux",
    "nacl", "netbsd", "openbsd", "plan9", "solaris", "wasip1", "windows", "zos",
];

/// Architectures known to file name and build tag matching.
pub const KNOWN_ARCH: &[&str] = &[
    "386", "amd64", "amd64p32", "arm", "armbe", "arm64", "arm64be", "loong64", "mips", "mipsle",
    "mips64", "mips64le", "mips64p32", "mips64p32le", "ppc", "ppc64", "ppc64le", "riscv",
    "riscv64", "s390", "s390x", "sparc", "sparc64", "wasm",
];

/// Operating systems matched by the `unix` build tag.
const UNIX_OS: &[&str] = &[
    "aix", "android", "darwin", "dragonfly", "freebsd", "hurd", "illumos", "ios", "linux",
    "netbsd", "openbsd", "solaris",
];

/// Standard library packages. Imports of these may be served from
/// package summaries instead of source.
pub const STD_PACKAGES: &[&str] = &[
    "archive/tar", "archive/zip", "bufio", "bytes", "cmd/cgo", "cmd/fix", "cmd/go", "cmd/gofmt",
    "cmd/yacc", "compress/bzip2", "compress/flate", "compress/gzip", "compress/lzw",
    "compress/zlib", "container/heap", "container/list", "container/ring", "crypto",
    "crypto/aes", "crypto/cipher", "crypto/des", "crypto/dsa", "crypto/ecdsa", "crypto/elliptic",
    "crypto/hmac", "crypto/md5", "crypto/rand", "crypto/rc4", "crypto/rsa", "crypto/sha1",
    "crypto/sha256", "crypto/sha512", "crypto/subtle", "crypto/tls", "crypto/x509",
    "crypto/x509/pkix", "database/sql", "database/sql/driver", "debug/dwarf", "debug/elf",
    "debug/gosym", "debug/macho", "debug/pe", "encoding", "encoding/ascii85", "encoding/asn1",
    "encoding/base32", "encoding/base64", "encoding/binary", "encoding/csv", "encoding/gob",
    "encoding/hex", "encoding/json", "encoding/pem", "encoding/xml", "errors", "expvar", "flag",
    "fmt", "go/ast", "go/build", "go/doc", "go/format", "go/parser", "go/printer", "go/scanner",
    "go/token", "hash", "hash/adler32", "hash/crc32", "hash/crc64", "hash/fnv", "html",
    "html/template", "image", "image/color", "image/color/palette", "image/draw", "image/gif",
    "image/jpeg", "image/png", "index/suffixarray", "io", "io/ioutil", "log", "log/syslog",
    "math", "math/big", "math/cmplx", "math/rand", "mime", "mime/multipart", "net", "net/http",
    "net/http/cgi", "net/http/cookiejar", "net/http/fcgi", "net/http/httptest",
    "net/http/httputil", "net/http/pprof", "net/mail", "net/rpc", "net/rpc/jsonrpc", "net/smtp",
    "net/textproto", "net/url", "os", "os/exec", "os/signal", "os/user", "path",
    "path/filepath", "reflect", "regexp", "regexp/syntax", "runtime", "runtime/cgo",
    "runtime/debug", "runtime/pprof", "runtime/race", "sort", "strconv", "strings", "sync",
    "sync/atomic", "syscall", "testing", "testing/iotest", "testing/quick", "text/scanner",
    "text/tabwriter", "text/template", "text/template/parse", "time", "unicode",
    "unicode/utf16", "unicode/utf8", "unsafe",
];

// ============================================================================
// BUILD CONTEXT
// ============================================================================

/// Where to look for packages and which files belong to a build.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuildContext {
    pub goroot: PathBuf,
    pub gopath: Vec<PathBuf>,
    pub goos: String,
    pub goarch: String,
    /// Suffix of the package install directory (`pkg/<os>_<arch>_<suffix>`).
    pub install_suffix: String,
    /// Extra tags satisfied by `//go:build` lines.
    pub build_tags: Vec<String>,
    pub cgo_enabled: bool,
    /// Propose builtin functions in completion candidates.
    pub builtins: bool,
    /// Packages besides the standard library that may be served from
    /// summaries.
    pub known_packages: Vec<String>,
}

impl Default for BuildContext {
    fn default() -> Self {
        Self::new("/usr/local/go", "linux", "amd64")
    }
}

impl BuildContext {
    pub fn new(goroot: impl Into<PathBuf>, goos: impl Into<String>, goarch: impl Into<String>) -> Self {
        Self {
            goroot: goroot.into(),
            gopath: Vec::new(),
            goos: goos.into(),
            goarch: goarch.into(),
            install_suffix: String::new(),
            build_tags: Vec::new(),
            cgo_enabled: true,
            builtins: false,
            known_packages: Vec::new(),
        }
    }

    pub fn with_gopath(mut self, gopath: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        self.gopath = gopath.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_tags(mut self, tags: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.build_tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_known_packages(mut self, paths: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.known_packages = paths.into_iter().map(Into::into).collect();
        self
    }

    /// GOROOT followed by every distinct GOPATH entry.
    pub fn roots(&self) -> Vec<&Path> {
        let mut roots = vec![self.goroot.as_path()];
        for path in &self.gopath {
            if path.as_os_str().is_empty() || roots.contains(&path.as_path()) {
                continue;
            }
            if path.to_str().is_some_and(|p| p.starts_with('~')) {
                continue;
            }
            roots.push(path.as_path());
        }
        roots
    }

    /// Source directories searched for import paths, in search order.
    pub fn src_dirs(&self) -> Vec<PathBuf> {
        self.roots().into_iter().map(|root| root.join("src")).collect()
    }

    /// `<os>_<arch>`, with the install suffix appended when set.
    pub fn os_arch(&self) -> String {
        if self.install_suffix.is_empty() {
            format!("{}_{}", self.goos, self.goarch)
        } else {
            format!("{}_{}_{}", self.goos, self.goarch, self.install_suffix)
        }
    }

    /// Compiled package directories, `<root>/pkg/<os_arch>`.
    pub fn pkg_dirs(&self) -> Vec<PathBuf> {
        let os_arch = self.os_arch();
        self.roots()
            .into_iter()
            .map(|root| root.join("pkg").join(&os_arch))
            .collect()
    }

    /// Whether imports of `path` may be served from a summary.
    pub fn is_known(&self, path: &str) -> bool {
        STD_PACKAGES.contains(&path) || self.known_packages.iter().any(|known| known == path)
    }

    /// Whether a single build tag is satisfied.
    pub fn match_tag(&self, tag: &str) -> bool {
        match tag {
            "gc" => true,
            "cgo" => self.cgo_enabled,
            "unix" => UNIX_OS.contains(&self.goos.as_str()),
            _ if tag == self.goos || tag == self.goarch => true,
            // `linux` files also build on android, `solaris` on illumos,
            // `darwin` on ios.
            "linux" => self.goos == "android",
            "solaris" => self.goos == "illumos",
            "darwin" => self.goos == "ios",
            _ if is_release_tag(tag) => true,
            _ => self.build_tags.iter().any(|t| t == tag),
        }
    }
}

/// `go1.N` tags are treated as satisfied.
fn is_release_tag(tag: &str) -> bool {
    tag.strip_prefix("go1.")
        .is_some_and(|minor| !minor.is_empty() && minor.bytes().all(|b| b.is_ascii_digit()))
}

// ============================================================================
// VERSIONED CONFIGURATION
// ============================================================================

/// A value paired with a generation counter.
///
/// Every accepted change increments the generation; holders of derived
/// state compare generations to know when to rebuild.
#[derive(Debug)]
pub struct Versioned<T> {
    value: Arc<T>,
    generation: u64,
}

impl<T> Clone for Versioned<T> {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
            generation: self.generation,
        }
    }
}

impl<T: PartialEq> Versioned<T> {
    pub fn new(value: T) -> Self {
        Self {
            value: Arc::new(value),
            generation: 1,
        }
    }

    pub fn get(&self) -> &T {
        &self.value
    }

    /// A shared handle to the current value.
    pub fn snapshot(&self) -> Arc<T> {
        self.value.clone()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Replace the value. Returns `true` if it differed, in which case a
    /// new generation starts.
    pub fn set(&mut self, value: T) -> bool {
        if *self.value == value {
            return false;
        }
        self.value = Arc::new(value);
        self.generation += 1;
        tracing::debug!(generation = self.generation, "configuration changed");
        true
    }
}
