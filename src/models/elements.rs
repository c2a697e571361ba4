//! # 元素数据表
//!
//! 提供元素的共价半径、标准 CPK 颜色和原子质量。
//!
//! 颜色采用 Jmol/Materials Project 的 CPK 方案（RGB 0-1），
//! 共价半径单位为 Å，用于成键判断和原子球体尺寸。
//!
//! ## 依赖关系
//! - 被 `geometry/` 和 `materials/` 使用
//! - 无外部模块依赖

/// RGB 颜色（0-1 范围）
pub type Rgb = [f64; 3];

/// 未知元素使用的共价半径 (Å)
pub const DEFAULT_COVALENT_RADIUS: f64 = 1.5;

/// 中性默认颜色
pub const NEUTRAL_COLOR: Rgb = [0.5, 0.5, 0.5];

/// 原子球体半径相对共价半径的比例
pub const ATOM_DISPLAY_RATIO: f64 = 0.5;

/// 单个元素条目
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Element {
    pub symbol: &'static str,
    pub number: u32,
    /// 共价半径 (Å)
    pub covalent_radius: f64,
    /// 标准 CPK 颜色
    pub color: Rgb,
    /// 原子质量 (u)
    pub mass: f64,
}

impl Element {
    /// 球体参考半径
    pub fn reference_radius(&self) -> f64 {
        self.covalent_radius * ATOM_DISPLAY_RATIO
    }
}

macro_rules! el {
    ($sym:expr, $z:expr, $r:expr, ($cr:expr, $cg:expr, $cb:expr), $m:expr) => {
        Element {
            symbol: $sym,
            number: $z,
            covalent_radius: $r,
            color: [$cr, $cg, $cb],
            mass: $m,
        }
    };
}

/// 元素表（按原子序数排列）
pub static ELEMENTS: &[Element] = &[
    // --- Period 1 ---
    el!("H", 1, 0.37, (1.0, 1.0, 1.0), 1.008),
    el!("He", 2, 0.32, (0.85, 1.0, 1.0), 4.0026),
    // --- Period 2 ---
    el!("Li", 3, 1.34, (0.8, 0.5, 1.0), 6.94),
    el!("Be", 4, 0.90, (0.76, 1.0, 0.0), 9.0122),
    el!("B", 5, 0.82, (1.0, 0.71, 0.71), 10.81),
    el!("C", 6, 0.77, (0.565, 0.565, 0.565), 12.011),
    el!("N", 7, 0.75, (0.19, 0.31, 0.97), 14.007),
    el!("O", 8, 0.73, (1.0, 0.05, 0.05), 15.999),
    el!("F", 9, 0.71, (0.56, 0.88, 0.31), 18.998),
    el!("Ne", 10, 0.69, (0.7, 0.89, 0.96), 20.180),
    // --- Period 3 ---
    el!("Na", 11, 1.54, (0.67, 0.36, 0.95), 22.990),
    el!("Mg", 12, 1.30, (0.54, 1.0, 0.0), 24.305),
    el!("Al", 13, 1.18, (0.75, 0.65, 0.65), 26.982),
    el!("Si", 14, 1.11, (0.94, 0.78, 0.63), 28.085),
    el!("P", 15, 1.06, (1.0, 0.5, 0.0), 30.974),
    el!("S", 16, 1.02, (1.0, 1.0, 0.19), 32.06),
    el!("Cl", 17, 0.99, (0.0, 1.0, 0.0), 35.45),
    el!("Ar", 18, 0.97, (0.5, 0.82, 0.89), 39.948),
    // --- Period 4 ---
    el!("K", 19, 1.96, (0.56, 0.25, 0.83), 39.098),
    el!("Ca", 20, 1.74, (0.24, 1.0, 0.0), 40.078),
    el!("Sc", 21, 1.44, (0.9, 0.9, 0.9), 44.956),
    el!("Ti", 22, 1.36, (0.75, 0.76, 0.78), 47.867),
    el!("V", 23, 1.25, (0.65, 0.65, 0.67), 50.942),
    el!("Cr", 24, 1.27, (0.54, 0.6, 0.78), 51.996),
    el!("Mn", 25, 1.39, (0.61, 0.48, 0.78), 54.938),
    el!("Fe", 26, 1.25, (0.88, 0.4, 0.2), 55.845),
    el!("Co", 27, 1.26, (0.94, 0.56, 0.63), 58.933),
    el!("Ni", 28, 1.21, (0.31, 0.82, 0.31), 58.693),
    el!("Cu", 29, 1.38, (0.78, 0.5, 0.2), 63.546),
    el!("Zn", 30, 1.31, (0.49, 0.5, 0.69), 65.38),
    el!("Ga", 31, 1.26, (0.76, 0.56, 0.56), 69.723),
    el!("Ge", 32, 1.22, (0.4, 0.56, 0.56), 72.630),
    el!("As", 33, 1.19, (0.74, 0.5, 0.89), 74.922),
    el!("Se", 34, 1.16, (1.0, 0.63, 0.0), 78.971),
    el!("Br", 35, 1.14, (0.65, 0.16, 0.16), 79.904),
    el!("Kr", 36, 1.10, (0.36, 0.72, 0.82), 83.798),
    // --- Period 5 ---
    el!("Rb", 37, 2.11, (0.44, 0.18, 0.69), 85.468),
    el!("Sr", 38, 1.92, (0.0, 1.0, 0.15), 87.62),
    el!("Y", 39, 1.62, (0.58, 1.0, 1.0), 88.906),
    el!("Zr", 40, 1.48, (0.58, 0.88, 0.88), 91.224),
    el!("Nb", 41, 1.37, (0.45, 0.76, 0.79), 92.906),
    el!("Mo", 42, 1.45, (0.33, 0.71, 0.71), 95.95),
    el!("Tc", 43, 1.56, (0.23, 0.62, 0.62), 98.0),
    el!("Ru", 44, 1.26, (0.14, 0.56, 0.56), 101.07),
    el!("Rh", 45, 1.35, (0.04, 0.49, 0.55), 102.91),
    el!("Pd", 46, 1.31, (0.0, 0.41, 0.52), 106.42),
    el!("Ag", 47, 1.53, (0.75, 0.75, 0.75), 107.87),
    el!("Cd", 48, 1.48, (1.0, 0.85, 0.56), 112.41),
    el!("In", 49, 1.44, (0.65, 0.46, 0.45), 114.82),
    el!("Sn", 50, 1.41, (0.4, 0.5, 0.5), 118.71),
    el!("Sb", 51, 1.38, (0.62, 0.39, 0.71), 121.76),
    el!("Te", 52, 1.35, (0.83, 0.48, 0.0), 127.60),
    el!("I", 53, 1.33, (0.58, 0.0, 0.58), 126.90),
    el!("Xe", 54, 1.30, (0.26, 0.62, 0.69), 131.29),
    // --- Period 6 ---
    el!("Cs", 55, 2.25, (0.34, 0.09, 0.56), 132.91),
    el!("Ba", 56, 1.98, (0.0, 0.79, 0.0), 137.33),
    el!("La", 57, 1.69, (0.44, 0.83, 1.0), 138.91),
    el!("Ce", 58, 1.65, (1.0, 1.0, 0.78), 140.12),
    el!("Pr", 59, 1.65, (0.85, 1.0, 0.78), 140.91),
    el!("Nd", 60, 1.64, (0.78, 1.0, 0.78), 144.24),
    el!("Pm", 61, 1.63, (0.64, 1.0, 0.78), 145.0),
    el!("Sm", 62, 1.62, (0.56, 1.0, 0.78), 150.36),
    el!("Eu", 63, 1.85, (0.38, 1.0, 0.78), 151.96),
    el!("Gd", 64, 1.61, (0.27, 1.0, 0.78), 157.25),
    el!("Tb", 65, 1.59, (0.19, 1.0, 0.78), 158.93),
    el!("Dy", 66, 1.59, (0.12, 1.0, 0.78), 162.50),
    el!("Ho", 67, 1.58, (0.0, 1.0, 0.61), 164.93),
    el!("Er", 68, 1.57, (0.0, 0.9, 0.46), 167.26),
    el!("Tm", 69, 1.56, (0.0, 0.83, 0.32), 168.93),
    el!("Yb", 70, 1.74, (0.0, 0.75, 0.22), 173.05),
    el!("Lu", 71, 1.56, (0.0, 0.67, 0.14), 174.97),
    el!("Hf", 72, 1.44, (0.3, 0.76, 1.0), 178.49),
    el!("Ta", 73, 1.34, (0.3, 0.65, 1.0), 180.95),
    el!("W", 74, 1.30, (0.13, 0.58, 0.84), 183.84),
    el!("Re", 75, 1.28, (0.15, 0.49, 0.67), 186.21),
    el!("Os", 76, 1.26, (0.15, 0.4, 0.59), 190.23),
    el!("Ir", 77, 1.27, (0.09, 0.33, 0.53), 192.22),
    el!("Pt", 78, 1.30, (0.81, 0.82, 0.88), 195.08),
    el!("Au", 79, 1.34, (1.0, 0.82, 0.14), 196.97),
    el!("Hg", 80, 1.49, (0.72, 0.72, 0.82), 200.59),
    el!("Tl", 81, 1.48, (0.65, 0.33, 0.3), 204.38),
    el!("Pb", 82, 1.47, (0.34, 0.35, 0.38), 207.2),
    el!("Bi", 83, 1.46, (0.62, 0.31, 0.71), 208.98),
    el!("Po", 84, 1.46, (0.67, 0.36, 0.0), 209.0),
    el!("At", 85, 1.45, (0.46, 0.31, 0.27), 210.0),
    el!("Rn", 86, 1.45, (0.26, 0.51, 0.59), 222.0),
    // --- Period 7 ---
    el!("Fr", 87, 2.60, (0.26, 0.0, 0.4), 223.0),
    el!("Ra", 88, 2.21, (0.0, 0.49, 0.0), 226.0),
    el!("Ac", 89, 2.15, (0.44, 0.67, 0.98), 227.0),
    el!("Th", 90, 2.06, (0.0, 0.73, 1.0), 232.04),
    el!("Pa", 91, 2.00, (0.0, 0.63, 1.0), 231.04),
    el!("U", 92, 1.96, (0.0, 0.56, 1.0), 238.03),
    el!("Np", 93, 1.90, (0.0, 0.5, 1.0), 237.0),
    el!("Pu", 94, 1.87, (0.0, 0.42, 1.0), 244.0),
    el!("Am", 95, 1.80, (0.33, 0.36, 0.95), 243.0),
    el!("Cm", 96, 1.69, (0.47, 0.36, 0.89), 247.0),
    el!("Bk", 97, 1.68, (0.54, 0.31, 0.89), 247.0),
    el!("Cf", 98, 1.68, (0.63, 0.21, 0.83), 251.0),
    el!("Es", 99, 1.65, (0.7, 0.12, 0.83), 252.0),
    el!("Fm", 100, 1.67, (0.7, 0.12, 0.73), 257.0),
    el!("Md", 101, 1.73, (0.7, 0.05, 0.65), 258.0),
    el!("No", 102, 1.76, (0.74, 0.05, 0.53), 259.0),
    el!("Lr", 103, 1.61, (0.78, 0.0, 0.4), 262.0),
];

/// 精确匹配元素符号
pub fn lookup(symbol: &str) -> Option<&'static Element> {
    ELEMENTS.iter().find(|e| e.symbol == symbol)
}

/// 规范化元素符号（"NA" / "na" -> "Na"），失败返回 None
pub fn normalize_symbol(raw: &str) -> Option<&'static str> {
    let mut chars = raw.chars();
    let first = chars.next()?.to_ascii_uppercase();
    let rest: String = chars.map(|c| c.to_ascii_lowercase()).collect();
    let candidate = format!("{}{}", first, rest);
    lookup(&candidate).map(|e| e.symbol)
}

/// 共价半径，缺失时返回默认值
pub fn covalent_radius(symbol: &str) -> f64 {
    lookup(symbol)
        .map(|e| e.covalent_radius)
        .unwrap_or(DEFAULT_COVALENT_RADIUS)
}

/// 球体参考半径，缺失时按默认共价半径计算
pub fn reference_radius(symbol: &str) -> f64 {
    covalent_radius(symbol) * ATOM_DISPLAY_RATIO
}

/// 标准 CPK 颜色，缺失时返回中性灰
pub fn standard_color(symbol: &str) -> Rgb {
    lookup(symbol).map(|e| e.color).unwrap_or(NEUTRAL_COLOR)
}

/// 原子质量，缺失时返回 0
pub fn atomic_mass(symbol: &str) -> f64 {
    lookup(symbol).map(|e| e.mass).unwrap_or(0.0)
}

/// 从原子标签中提取元素符号（"Na1" -> "Na", "O2-" -> "O", "CL" -> "Cl"）
pub fn symbol_from_label(label: &str) -> Option<&'static str> {
    let letters: String = label
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect();
    if letters.is_empty() {
        return None;
    }
    // 先尝试两个字母，再尝试一个字母
    if letters.len() >= 2 {
        if let Some(sym) = normalize_symbol(&letters[..2]) {
            return Some(sym);
        }
    }
    normalize_symbol(&letters[..1])
}
