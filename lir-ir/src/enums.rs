//! Keyword enumerations
//!
//! Every enumeration has a canonical spelling (`Display`) and parses back
//! from that spelling (`FromStr`).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A keyword that does not name any variant of the expected enumeration
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid {kind} keyword {text:?}")]
pub struct UnknownKeyword {
    pub kind: &'static str,
    pub text: String,
}

macro_rules! keyword_enum {
    ($(#[$meta:meta])* $name:ident { $($(#[$vmeta:meta])* $variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownKeyword;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    _ => Err(UnknownKeyword {
                        kind: stringify!($name),
                        text: s.to_string(),
                    }),
                }
            }
        }
    };
}

keyword_enum! {
    Linkage {
        Private => "private",
        Internal => "internal",
        AvailableExternally => "available_externally",
        LinkOnce => "linkonce",
        Weak => "weak",
        Common => "common",
        Appending => "appending",
        ExternWeak => "extern_weak",
        LinkOnceOdr => "linkonce_odr",
        WeakOdr => "weak_odr",
        External => "external",
    }
}

keyword_enum! {
    Preemption {
        DsoLocal => "dso_local",
        DsoPreemptable => "dso_preemptable",
    }
}

keyword_enum! {
    Visibility {
        Default => "default",
        Hidden => "hidden",
        Protected => "protected",
    }
}

keyword_enum! {
    DllStorageClass {
        DllImport => "dllimport",
        DllExport => "dllexport",
    }
}

keyword_enum! {
    /// Thread-local storage model, spelled with its `thread_local` keyword
    TlsModel {
        Generic => "thread_local",
        LocalDynamic => "thread_local(localdynamic)",
        InitialExec => "thread_local(initialexec)",
        LocalExec => "thread_local(localexec)",
    }
}

keyword_enum! {
    UnnamedAddr {
        UnnamedAddr => "unnamed_addr",
        LocalUnnamedAddr => "local_unnamed_addr",
    }
}

keyword_enum! {
    /// Comdat selection kind
    SelectionKind {
        Any => "any",
        ExactMatch => "exactmatch",
        Largest => "largest",
        NoDuplicates => "noduplicates",
        SameSize => "samesize",
    }
}

keyword_enum! {
    /// Integer comparison predicate
    IPred {
        Eq => "eq",
        Ne => "ne",
        Sge => "sge",
        Sgt => "sgt",
        Sle => "sle",
        Slt => "slt",
        Uge => "uge",
        Ugt => "ugt",
        Ule => "ule",
        Ult => "ult",
    }
}

keyword_enum! {
    /// Floating-point comparison predicate
    FPred {
        False => "false",
        Oeq => "oeq",
        Oge => "oge",
        Ogt => "ogt",
        Ole => "ole",
        Olt => "olt",
        One => "one",
        Ord => "ord",
        True => "true",
        Ueq => "ueq",
        Uge => "uge",
        Ugt => "ugt",
        Ule => "ule",
        Ult => "ult",
        Une => "une",
        Uno => "uno",
    }
}

keyword_enum! {
    AtomicOrdering {
        Unordered => "unordered",
        Monotonic => "monotonic",
        Acquire => "acquire",
        Release => "release",
        AcqRel => "acq_rel",
        SeqCst => "seq_cst",
    }
}

keyword_enum! {
    /// Operation of an `atomicrmw` instruction
    AtomicOp {
        Xchg => "xchg",
        Add => "add",
        Sub => "sub",
        And => "and",
        Nand => "nand",
        Or => "or",
        Xor => "xor",
        Max => "max",
        Min => "min",
        UMax => "umax",
        UMin => "umin",
        FAdd => "fadd",
        FSub => "fsub",
    }
}

keyword_enum! {
    /// Overflow, exactness and fast-math flags
    OpFlag {
        Nuw => "nuw",
        Nsw => "nsw",
        Exact => "exact",
        Nnan => "nnan",
        Ninf => "ninf",
        Nsz => "nsz",
        Arcp => "arcp",
        Contract => "contract",
        Afn => "afn",
        Reassoc => "reassoc",
        Fast => "fast",
    }
}

keyword_enum! {
    Tail {
        Tail => "tail",
        MustTail => "musttail",
        NoTail => "notail",
    }
}

keyword_enum! {
    /// Binary arithmetic and bitwise opcodes
    BinaryOp {
        Add => "add",
        FAdd => "fadd",
        Sub => "sub",
        FSub => "fsub",
        Mul => "mul",
        FMul => "fmul",
        UDiv => "udiv",
        SDiv => "sdiv",
        FDiv => "fdiv",
        URem => "urem",
        SRem => "srem",
        FRem => "frem",
        Shl => "shl",
        LShr => "lshr",
        AShr => "ashr",
        And => "and",
        Or => "or",
        Xor => "xor",
    }
}

impl BinaryOp {
    pub fn is_float_op(self) -> bool {
        matches!(
            self,
            BinaryOp::FAdd | BinaryOp::FSub | BinaryOp::FMul | BinaryOp::FDiv | BinaryOp::FRem
        )
    }
}

keyword_enum! {
    /// Conversion opcodes
    CastOp {
        Trunc => "trunc",
        ZExt => "zext",
        SExt => "sext",
        FPTrunc => "fptrunc",
        FPExt => "fpext",
        FPToUI => "fptoui",
        FPToSI => "fptosi",
        UIToFP => "uitofp",
        SIToFP => "sitofp",
        PtrToInt => "ptrtoint",
        IntToPtr => "inttoptr",
        BitCast => "bitcast",
        AddrSpaceCast => "addrspacecast",
    }
}

/// Calling convention
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CallingConv {
    C,
    Fast,
    Cold,
    Ghc,
    Swift,
    PreserveMost,
    PreserveAll,
    X86StdCall,
    X86FastCall,
    X86ThisCall,
    X86VectorCall,
    ArmApcs,
    ArmAapcs,
    ArmAapcsVfp,
    Win64,
    X86_64SysV,
    AmdgpuKernel,
    PtxKernel,
    SpirKernel,
    SpirFunc,
    /// `cc N`
    Numbered(u32),
}

const NAMED_CALLING_CONVS: &[(CallingConv, &str)] = &[
    (CallingConv::C, "ccc"),
    (CallingConv::Fast, "fastcc"),
    (CallingConv::Cold, "coldcc"),
    (CallingConv::Ghc, "ghccc"),
    (CallingConv::Swift, "swiftcc"),
    (CallingConv::PreserveMost, "preserve_mostcc"),
    (CallingConv::PreserveAll, "preserve_allcc"),
    (CallingConv::X86StdCall, "x86_stdcallcc"),
    (CallingConv::X86FastCall, "x86_fastcallcc"),
    (CallingConv::X86ThisCall, "x86_thiscallcc"),
    (CallingConv::X86VectorCall, "x86_vectorcallcc"),
    (CallingConv::ArmApcs, "arm_apcscc"),
    (CallingConv::ArmAapcs, "arm_aapcscc"),
    (CallingConv::ArmAapcsVfp, "arm_aapcs_vfpcc"),
    (CallingConv::Win64, "win64cc"),
    (CallingConv::X86_64SysV, "x86_64_sysvcc"),
    (CallingConv::AmdgpuKernel, "amdgpu_kernel"),
    (CallingConv::PtxKernel, "ptx_kernel"),
    (CallingConv::SpirKernel, "spir_kernel"),
    (CallingConv::SpirFunc, "spir_func"),
];

impl fmt::Display for CallingConv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let CallingConv::Numbered(n) = self {
            return write!(f, "cc {}", n);
        }
        let name = NAMED_CALLING_CONVS
            .iter()
            .find(|(cc, _)| cc == self)
            .map(|(_, name)| *name)
            .unwrap_or("ccc");
        f.write_str(name)
    }
}

impl FromStr for CallingConv {
    type Err = UnknownKeyword;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unknown = || UnknownKeyword {
            kind: "CallingConv",
            text: s.to_string(),
        };
        if let Some(n) = s.strip_prefix("cc ") {
            return n.trim().parse().map(CallingConv::Numbered).map_err(|_| unknown());
        }
        NAMED_CALLING_CONVS
            .iter()
            .find(|(_, name)| *name == s)
            .map(|(cc, _)| *cc)
            .ok_or_else(unknown)
    }
}

/// Render a flag list as ` flag flag` (leading space per flag)
pub(crate) fn fmt_flags(f: &mut fmt::Formatter<'_>, flags: &[OpFlag]) -> fmt::Result {
    for flag in flags {
        write!(f, " {}", flag)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keywords_parse_back() {
        for linkage in Linkage::ALL {
            assert_eq!(linkage.to_string().parse::<Linkage>(), Ok(*linkage));
        }
        for pred in FPred::ALL {
            assert_eq!(pred.as_str().parse::<FPred>(), Ok(*pred));
        }
        assert_eq!("acq_rel".parse::<AtomicOrdering>(), Ok(AtomicOrdering::AcqRel));
    }

    #[test]
    fn test_unknown_keyword() {
        let err = "weakest".parse::<Linkage>().unwrap_err();
        assert_eq!(err.to_string(), "invalid Linkage keyword \"weakest\"");
    }

    #[test]
    fn test_tls_spelling() {
        assert_eq!(TlsModel::Generic.to_string(), "thread_local");
        assert_eq!(TlsModel::InitialExec.to_string(), "thread_local(initialexec)");
    }

    #[test]
    fn test_calling_conv() {
        assert_eq!(CallingConv::Fast.to_string(), "fastcc");
        assert_eq!(CallingConv::Numbered(42).to_string(), "cc 42");
        assert_eq!("cc 42".parse::<CallingConv>(), Ok(CallingConv::Numbered(42)));
        assert_eq!("x86_64_sysvcc".parse::<CallingConv>(), Ok(CallingConv::X86_64SysV));
        assert!("cc x".parse::<CallingConv>().is_err());
    }
}
