use std::fmt;

/// 结果文件中扁平化后的叶子值，支持递归结构
#[derive(Clone, PartialEq)]
pub enum ParameterValue {
    // ————————————————————————————————————————————————————————————————————————
    // 基本值类型，包含字符串、数字、布尔值等
    // ————————————————————————————————————————————————————————————————————————
    Basic(BasicParameterValue),
    // ————————————————————————————————————————————————————————————————————————
    // 简单值组成的列表（如 ks: [1, 3, 10]）
    // ————————————————————————————————————————————————————————————————————————
    List(Vec<ParameterValue>),
}

/// 基本值类型，用于List中，只包含基本类型
#[derive(Clone, PartialEq)]
pub enum BasicParameterValue {
    String(String), // 字符串类型
    Float(f64),     // 浮点数类型
    Int(i64),       // 整数类型
    Bool(bool),     // 布尔类型
}

/// 为BasicParameterValue实现Debug trait，使用Display的格式
impl fmt::Debug for BasicParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

impl BasicParameterValue {
    pub fn to_string_repr(&self) -> String {
        match self {
            BasicParameterValue::String(s) => s.clone(),
            BasicParameterValue::Float(n) => format!("{:.6}", n),
            BasicParameterValue::Int(n) => n.to_string(),
            BasicParameterValue::Bool(b) => b.to_string(),
        }
    }

    /// 写入汇总表时的文本形式：浮点数保留全部精度，布尔值为 True/False
    pub fn to_cell(&self) -> String {
        match self {
            BasicParameterValue::String(s) => s.clone(),
            BasicParameterValue::Float(n) => n.to_string(),
            BasicParameterValue::Int(n) => n.to_string(),
            BasicParameterValue::Bool(true) => "True".to_string(),
            BasicParameterValue::Bool(false) => "False".to_string(),
        }
    }

    /// 尝试将值解释为数值指标
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            BasicParameterValue::Float(n) => Some(*n),
            BasicParameterValue::Int(n) => Some(*n as f64),
            BasicParameterValue::String(s) => s.trim().parse().ok(),
            BasicParameterValue::Bool(_) => None,
        }
    }
}

/// 为BasicParameterValue实现Display trait，支持format!("{}", value)语法
impl fmt::Display for BasicParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_string_repr())
    }
}

impl ParameterValue {
    pub fn to_cell(&self) -> String {
        match self {
            ParameterValue::Basic(basic_value) => basic_value.to_cell(),
            ParameterValue::List(list) => {
                let items: Vec<String> = list.iter().map(|item| item.to_cell()).collect();
                format!("[{}]", items.join(", "))
            }
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParameterValue::Basic(basic_value) => basic_value.as_f64(),
            ParameterValue::List(_) => None,
        }
    }
}

/// 为ParameterValue实现Debug trait，使用Display的格式
impl fmt::Debug for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

impl fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterValue::Basic(basic_value) => write!(f, "{}", basic_value),
            ParameterValue::List(list) => {
                let items: Vec<String> = list.iter().map(|item| item.to_string()).collect();
                write!(f, "[{}]", items.join(", "))
            }
        }
    }
}
