//! Connection limit configuration types

nonzero_setting! {
    /// A non-zero connection limit
    ///
    /// Used for both the idle capacity and the optional total ceiling, so a
    /// pool can never be configured to hold zero connections.
    ///
    /// # Examples
    /// ```
    /// use tcp_pool::types::MaxConnections;
    ///
    /// let max = MaxConnections::new(10).unwrap();
    /// assert_eq!(max.get(), 10);
    ///
    /// // Zero connections is invalid
    /// assert!(MaxConnections::new(0).is_none());
    /// ```
    #[doc(alias = "pool_size")]
    #[doc(alias = "connection_limit")]
    pub struct MaxConnections(usize), zero => ZeroCapacity;
}

impl MaxConnections {
    /// Default idle capacity of a pool
    pub const DEFAULT: Self =
        Self(std::num::NonZero::new(crate::constants::pool::DEFAULT_MAX_IDLE).unwrap());
}

impl Default for MaxConnections {
    fn default() -> Self {
        Self::DEFAULT
    }
}
