//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 合约快照测试
//! - 引擎端到端测试 (文件落盘、并发写入、重试、关闭排空)
//! - HTTP 接入端到端测试

#[cfg(test)]
mod support;

#[cfg(test)]
mod contract_tests {
    #[test]
    fn test_contracts_compile() {
        // 验证 contracts crate 可编译
        let _ = contracts::ConfigVersion::V1;
        let _ = contracts::StorageKind::File;
    }
}

#[cfg(test)]
mod config_e2e;
#[cfg(test)]
mod engine_e2e;
#[cfg(test)]
mod gateway_e2e;
