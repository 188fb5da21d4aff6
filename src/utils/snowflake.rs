//! 雪花 ID 生成器
//!
//! 布局（共 63 位，符号位恒为 0）：
//! `41 位毫秒时间戳 | 5 位数据中心 | 5 位工作节点 | 12 位序列号`

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::warn;

use crate::errors::{AppError, Result};

/// 起始时间 2010-11-04 01:42:54.657 UTC
pub const EPOCH_MS: i64 = 1_288_834_974_657;

const WORKER_ID_BITS: u32 = 5;
const DATACENTER_ID_BITS: u32 = 5;
const SEQUENCE_BITS: u32 = 12;

/// 数据中心 / 工作节点 ID 的最大值（31）
pub const MAX_NODE_ID: u64 = (1 << WORKER_ID_BITS) - 1;
const MAX_SEQUENCE: u64 = (1 << SEQUENCE_BITS) - 1;

const WORKER_ID_SHIFT: u32 = SEQUENCE_BITS;
const DATACENTER_ID_SHIFT: u32 = SEQUENCE_BITS + WORKER_ID_BITS;
const TIMESTAMP_SHIFT: u32 = SEQUENCE_BITS + WORKER_ID_BITS + DATACENTER_ID_BITS;

/// 允许等待的时钟回拨幅度
const MAX_BACKWARD_MS: i64 = 5;
/// 等待新毫秒的轮询间隔与最大轮数
const SPIN_DELAY: Duration = Duration::from_micros(100);
const MAX_WAIT_ROUNDS: u32 = 1000;

/// 毫秒时钟
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> i64;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

#[derive(Debug, Default)]
struct State {
    last_timestamp: i64,
    sequence: u64,
}

pub struct SnowflakeIdGenerator {
    datacenter_id: u64,
    worker_id: u64,
    clock: Arc<dyn Clock>,
    state: Mutex<State>,
}

impl std::fmt::Debug for SnowflakeIdGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnowflakeIdGenerator")
            .field("datacenter_id", &self.datacenter_id)
            .field("worker_id", &self.worker_id)
            .finish()
    }
}

impl SnowflakeIdGenerator {
    pub fn new(datacenter_id: u64, worker_id: u64) -> Result<Self> {
        Self::with_clock(datacenter_id, worker_id, Arc::new(SystemClock))
    }

    pub fn with_clock(datacenter_id: u64, worker_id: u64, clock: Arc<dyn Clock>) -> Result<Self> {
        if datacenter_id > MAX_NODE_ID {
            return Err(AppError::config(format!(
                "datacenter_id must be between 0 and {}",
                MAX_NODE_ID
            )));
        }
        if worker_id > MAX_NODE_ID {
            return Err(AppError::config(format!(
                "worker_id must be between 0 and {}",
                MAX_NODE_ID
            )));
        }

        Ok(Self {
            datacenter_id,
            worker_id,
            clock,
            state: Mutex::new(State::default()),
        })
    }

    /// 生成下一个 ID
    ///
    /// 同一实例生成的 ID 严格递增。时钟回拨或序列号耗尽时释放锁后再等待，
    /// 最多等待 `MAX_WAIT_ROUNDS` 轮，时钟仍未前进则返回错误。
    pub fn next_id(&self) -> Result<i64> {
        let mut rounds = 0u32;
        loop {
            match self.try_next_id()? {
                Next::Id(id) => return Ok(id),
                Next::Wait(delay) => {
                    rounds += 1;
                    if rounds > MAX_WAIT_ROUNDS {
                        return Err(AppError::id_generation(
                            "clock did not advance while waiting for a new millisecond",
                        ));
                    }
                    std::thread::sleep(delay);
                }
            }
        }
    }

    fn try_next_id(&self) -> Result<Next> {
        let mut state = self.state.lock();
        let timestamp = self.clock.now_ms();

        if timestamp < state.last_timestamp {
            let offset = state.last_timestamp - timestamp;
            if offset > MAX_BACKWARD_MS {
                return Err(AppError::id_generation(format!(
                    "clock moved backwards by {} ms",
                    offset
                )));
            }
            warn!("Clock moved backwards by {} ms, waiting", offset);
            return Ok(Next::Wait(Duration::from_millis(offset as u64)));
        }

        if timestamp == state.last_timestamp {
            if state.sequence == MAX_SEQUENCE {
                // 序列号耗尽，等下一毫秒
                return Ok(Next::Wait(SPIN_DELAY));
            }
            state.sequence += 1;
        } else {
            state.sequence = 0;
        }

        let elapsed = timestamp - EPOCH_MS;
        if elapsed < 0 {
            return Err(AppError::id_generation(format!(
                "system clock {} ms is before the id epoch",
                timestamp
            )));
        }
        state.last_timestamp = timestamp;

        Ok(Next::Id(
            (elapsed << TIMESTAMP_SHIFT)
                | ((self.datacenter_id << DATACENTER_ID_SHIFT) as i64)
                | ((self.worker_id << WORKER_ID_SHIFT) as i64)
                | state.sequence as i64,
        ))
    }
}

enum Next {
    Id(i64),
    Wait(Duration),
}

/// 拆解 ID：`(时间戳毫秒, 数据中心, 工作节点, 序列号)`
pub fn decompose(id: i64) -> (i64, u64, u64, u64) {
    let id = id as u64;
    let timestamp = (id >> TIMESTAMP_SHIFT) as i64 + EPOCH_MS;
    let datacenter = (id >> DATACENTER_ID_SHIFT) & MAX_NODE_ID;
    let worker = (id >> WORKER_ID_SHIFT) & MAX_NODE_ID;
    let sequence = id & MAX_SEQUENCE;
    (timestamp, datacenter, worker, sequence)
}
