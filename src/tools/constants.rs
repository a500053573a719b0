//! 常量和默认配置集中管理
//!
//! 将所有重要常量集中定义，避免"默认值漂移"和重复定义

/// 默认配置值
pub mod defaults {
    /// 默认目标采样率 (Hz)
    ///
    /// 语音识别引擎的输入采样率
    pub const TARGET_SAMPLE_RATE: u32 = 16000;

    /// 默认多文件并行并发度
    pub const PARALLEL_FILES_DEGREE: usize = 4;
}

/// 并发度限制常量
pub mod parallel_limits {
    /// 最小并发度
    pub const MIN_PARALLEL_DEGREE: usize = 1;

    /// 最大并发度
    ///
    /// 每个文件的样本全部驻留内存，并发过高时内存占用按文件数线性增长
    pub const MAX_PARALLEL_DEGREE: usize = 16;
}

/// 单位换算
pub mod units {
    /// 配置中 `max_file_size_mb` 的换算基数
    pub const BYTES_PER_MB: u64 = 1024 * 1024;
}
