//! Conditional execution.
//!
//! Every instruction carries a 4-bit condition in bits 28-31. The instruction
//! only takes effect when the condition holds for the current flags.
//!
//! Only the signed comparisons and the sign/zero tests are evaluated. The
//! remaining codes (NE, CS, CC, VS, VC, HI, LS, NV) execute unconditionally,
//! exactly like AL.

use crate::cpu::registers::Flags;
use serde::{Deserialize, Serialize};

/// Condition codes, numbered as they appear in the instruction word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Condition {
    /// Equal (Z)
    EQ = 0x0,
    /// Not equal
    NE = 0x1,
    /// Carry set
    CS = 0x2,
    /// Carry clear
    CC = 0x3,
    /// Negative (N)
    MI = 0x4,
    /// Positive or zero (!N)
    PL = 0x5,
    /// Overflow set
    VS = 0x6,
    /// Overflow clear
    VC = 0x7,
    /// Unsigned higher
    HI = 0x8,
    /// Unsigned lower or same
    LS = 0x9,
    /// Signed greater or equal (N == V)
    GE = 0xA,
    /// Signed less than (N != V)
    LT = 0xB,
    /// Signed greater than (!Z && N == V)
    GT = 0xC,
    /// Signed less or equal (Z || N != V)
    LE = 0xD,
    /// Always
    AL = 0xE,
    /// Reserved
    NV = 0xF,
}

impl From<u8> for Condition {
    fn from(code: u8) -> Self {
        use Condition::*;
        match code & 0xF {
            0x0 => EQ,
            0x1 => NE,
            0x2 => CS,
            0x3 => CC,
            0x4 => MI,
            0x5 => PL,
            0x6 => VS,
            0x7 => VC,
            0x8 => HI,
            0x9 => LS,
            0xA => GE,
            0xB => LT,
            0xC => GT,
            0xD => LE,
            0xE => AL,
            _ => NV,
        }
    }
}

impl Condition {
    /// Mnemonic suffix. AL is implied and prints as nothing.
    pub fn suffix(self) -> &'static str {
        use Condition::*;
        match self {
            EQ => "EQ",
            NE => "NE",
            CS => "CS",
            CC => "CC",
            MI => "MI",
            PL => "PL",
            VS => "VS",
            VC => "VC",
            HI => "HI",
            LS => "LS",
            GE => "GE",
            LT => "LT",
            GT => "GT",
            LE => "LE",
            AL => "",
            NV => "NV",
        }
    }
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.suffix())
    }
}

/// Whether an instruction with condition `cond` executes under `flags`.
pub fn condition_passed(flags: &Flags, cond: Condition) -> bool {
    match cond {
        Condition::EQ => flags.zero,
        Condition::MI => flags.negative,
        Condition::PL => !flags.negative,
        Condition::GE => flags.negative == flags.overflow,
        Condition::LT => flags.negative != flags.overflow,
        Condition::GT => !flags.zero && flags.negative == flags.overflow,
        Condition::LE => flags.zero || flags.negative != flags.overflow,
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flags(negative: bool, zero: bool, carry: bool, overflow: bool) -> Flags {
        Flags { negative, zero, carry, overflow }
    }

    #[test]
    fn test_from_code_roundtrip() {
        for code in 0u8..16 {
            assert_eq!(Condition::from(code) as u8, code);
        }
    }

    #[test]
    fn test_eq() {
        assert!(condition_passed(&flags(false, true, false, false), Condition::EQ));
        assert!(!condition_passed(&flags(false, false, false, false), Condition::EQ));
    }

    #[test]
    fn test_mi_pl() {
        let neg = flags(true, false, false, false);
        assert!(condition_passed(&neg, Condition::MI));
        assert!(!condition_passed(&neg, Condition::PL));
        let pos = Flags::default();
        assert!(!condition_passed(&pos, Condition::MI));
        assert!(condition_passed(&pos, Condition::PL));
    }

    #[test]
    fn test_ge_lt_with_n_and_v_set() {
        let f = flags(true, false, false, true);
        assert!(condition_passed(&f, Condition::GE));
        assert!(!condition_passed(&f, Condition::LT));
    }

    #[test]
    fn test_ge_lt_with_n_only() {
        let f = flags(true, false, false, false);
        assert!(!condition_passed(&f, Condition::GE));
        assert!(condition_passed(&f, Condition::LT));
    }

    #[test]
    fn test_gt_le() {
        let zero = flags(false, true, false, false);
        assert!(!condition_passed(&zero, Condition::GT));
        assert!(condition_passed(&zero, Condition::LE));

        let greater = Flags::default();
        assert!(condition_passed(&greater, Condition::GT));
        assert!(!condition_passed(&greater, Condition::LE));

        let less = flags(false, false, false, true);
        assert!(!condition_passed(&less, Condition::GT));
        assert!(condition_passed(&less, Condition::LE));
    }

    #[test]
    fn test_unlisted_codes_always_pass() {
        let f = flags(false, true, false, false);
        for cond in [
            Condition::NE,
            Condition::CS,
            Condition::CC,
            Condition::VS,
            Condition::VC,
            Condition::HI,
            Condition::LS,
            Condition::AL,
            Condition::NV,
        ] {
            assert!(condition_passed(&f, cond), "{cond:?} should pass");
        }
    }

    #[test]
    fn test_suffix() {
        assert_eq!(Condition::AL.suffix(), "");
        assert_eq!(Condition::LE.to_string(), "LE");
    }
}
